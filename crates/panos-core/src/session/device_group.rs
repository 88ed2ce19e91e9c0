use tracing::warn;

use super::gateway::GatewaySession;

/// One (device, vsys) member of a device group.
#[derive(Debug, Clone)]
pub struct DeviceGroupTarget {
    pub device_name: String,
    /// `None` when the whole device belongs to the group.
    pub vsys: Option<String>,
    pub gateway: GatewaySession,
}

impl DeviceGroupTarget {
    pub fn new(gateway: GatewaySession, vsys: Option<String>) -> Self {
        Self {
            device_name: gateway.hostname().to_owned(),
            vsys,
            gateway,
        }
    }
}

/// A Panorama device group and the managed devices it targets.
#[derive(Debug, Clone)]
pub struct DeviceGroup {
    name: String,
    targets: Vec<DeviceGroupTarget>,
}

impl DeviceGroup {
    /// Targets naming a vsys the device doesn't have are dropped with a
    /// warning: Panorama config may still reference vsys that were removed
    /// or renamed on the firewall.
    pub fn new(name: impl Into<String>, targets: Vec<DeviceGroupTarget>) -> Self {
        let name = name.into();
        let targets = targets
            .into_iter()
            .filter(|target| match &target.vsys {
                Some(vsys) if !target.gateway.has_vsys(vsys) => {
                    warn!(
                        device_group = %name,
                        device = %target.device_name,
                        vsys = %vsys,
                        "vsys not found on device, dropping device-group target"
                    );
                    false
                }
                _ => true,
            })
            .collect();
        Self { name, targets }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> Vec<DeviceGroupTarget> {
        self.targets.clone()
    }

    /// Gateways of every target, in target order. A multi-vsys device
    /// appears once per targeted vsys.
    pub fn gateways(&self) -> Vec<GatewaySession> {
        self.targets.iter().map(|t| t.gateway.clone()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use panos_api::{Credentials, DeviceClient, base_url_for};
    use secrecy::SecretString;

    use super::*;
    use crate::model::{DeviceIdentity, HaPeerState, VsysInfo};

    fn gateway(name: &str, vsys: &[&str]) -> GatewaySession {
        let client = DeviceClient::with_client(
            reqwest::Client::new(),
            base_url_for("192.0.2.1").unwrap(),
            "10.1",
            Credentials::ApiKey(SecretString::from("k".to_owned())),
        );
        let identity = DeviceIdentity {
            address: "192.0.2.1".into(),
            api_version: "10.1".into(),
            serial: format!("{name}-serial"),
            hostname: name.into(),
            device_name: name.into(),
            ha_state: HaPeerState::NotEnabled,
            multi_vsys: vsys.len() > 1,
        };
        let vsys = vsys.iter().map(|v| VsysInfo::new(*v, *v)).collect();
        GatewaySession::hydrated(client, identity, vsys)
    }

    #[test]
    fn drops_targets_with_unknown_vsys() {
        let fw = gateway("fw1", &["vsys1", "vsys2"]);
        let group = DeviceGroup::new(
            "branch",
            vec![
                DeviceGroupTarget::new(fw.clone(), Some("vsys1".into())),
                DeviceGroupTarget::new(fw.clone(), Some("vsys9".into())),
                DeviceGroupTarget::new(fw, None),
            ],
        );
        let kept: Vec<_> = group.targets().into_iter().map(|t| t.vsys).collect();
        assert_eq!(kept, vec![Some("vsys1".to_owned()), None]);
        assert_eq!(group.gateways().len(), 2);
        assert_eq!(group.name(), "branch");
    }
}
