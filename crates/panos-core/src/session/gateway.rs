use std::time::Duration;

use indexmap::IndexMap;
use panos_api::{
    DeviceClient, ErrorPolicy, RetryPolicy, TransportConfig, base_url_for,
};
use tracing::info;

use super::{DEFAULT_INIT_TIMEOUT, DeviceSession, query_ha_state, query_system_info};
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, HaPeerState, VsysInfo};

const VSYS_ROUTE: &str = "Device/VirtualSystems";

/// Connection options for a firewall.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Error policy the session switches to once bootstrap is done.
    pub policy: ErrorPolicy,
    pub init_timeout: Duration,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            policy: ErrorPolicy::Raise,
            init_timeout: DEFAULT_INIT_TIMEOUT,
            transport: TransportConfig::default(),
            retry: RetryPolicy::gateway(),
        }
    }
}

/// A connected firewall.
///
/// Either bootstrapped directly with [`connect`](Self::connect) or built
/// from data Panorama already has ([`hydrated`](Self::hydrated)); both
/// behave the same afterwards.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    client: DeviceClient,
    identity: DeviceIdentity,
    vsys: Vec<VsysInfo>,
}

impl GatewaySession {
    /// Bootstrap a session: system info, HA state, then (on multi-vsys
    /// firewalls) the vsys listing. Any failing step aborts.
    pub async fn connect(
        address: &str,
        config: &DeviceConfig,
        options: GatewayOptions,
    ) -> Result<Self, CoreError> {
        let credentials = config.credentials()?;
        let mut client = DeviceClient::new(
            base_url_for(address)?,
            config.api_version.clone(),
            credentials,
            &options.transport,
        )?
        .with_request_delay(config.request_delay())
        .with_retry(options.retry);

        let system = query_system_info(&client, options.init_timeout).await?;
        client.set_device_name(system.hostname.clone());
        let ha_state = query_ha_state(&client).await?;
        let vsys = if system.multi_vsys {
            list_vsys(&client).await?
        } else {
            Vec::new()
        };
        client.commit(options.policy);

        let identity = DeviceIdentity {
            address: address.to_owned(),
            api_version: config.api_version.clone(),
            serial: system.serial,
            device_name: system.hostname.clone(),
            hostname: system.hostname,
            ha_state,
            multi_vsys: system.multi_vsys,
        };
        info!(
            device = %identity.device_name,
            serial = %identity.serial,
            ha = %identity.ha_state,
            vsys = vsys.len(),
            "gateway session ready"
        );

        Ok(Self {
            client,
            identity,
            vsys,
        })
    }

    /// Build a session from known facts without contacting the device.
    pub fn hydrated(client: DeviceClient, identity: DeviceIdentity, vsys: Vec<VsysInfo>) -> Self {
        Self {
            client,
            identity,
            vsys,
        }
    }

    pub fn serial(&self) -> &str {
        &self.identity.serial
    }

    pub fn hostname(&self) -> &str {
        &self.identity.hostname
    }

    pub fn address(&self) -> &str {
        &self.identity.address
    }

    pub fn is_multi_vsys(&self) -> bool {
        self.identity.multi_vsys
    }

    // ── Vsys ─────────────────────────────────────────────────────

    pub fn vsys_info(&self) -> Vec<VsysInfo> {
        self.vsys.clone()
    }

    /// Internal vsys name → display name.
    pub fn vsys_display_names(&self) -> IndexMap<String, String> {
        self.vsys
            .iter()
            .map(|v| (v.name.clone(), v.display_name.clone()))
            .collect()
    }

    pub fn has_vsys(&self, name: &str) -> bool {
        self.vsys.iter().any(|v| v.name == name)
    }

    /// Re-read the vsys listing. Panorama tags already known for a vsys
    /// are kept.
    pub async fn refresh_vsys_info(&mut self) -> Result<Vec<VsysInfo>, CoreError> {
        let mut fresh = list_vsys(&self.client).await?;
        for vsys in &mut fresh {
            if let Some(known) = self.vsys.iter().find(|v| v.name == vsys.name) {
                vsys.panorama_tags.clone_from(&known.panorama_tags);
            }
        }
        self.vsys = fresh;
        Ok(self.vsys.clone())
    }
}

impl DeviceSession for GatewaySession {
    fn client(&self) -> &DeviceClient {
        &self.client
    }

    fn client_mut(&mut self) -> &mut DeviceClient {
        &mut self.client
    }

    fn identity(&self) -> DeviceIdentity {
        self.identity.clone()
    }

    fn ha_peer_state(&self) -> HaPeerState {
        self.identity.ha_state
    }

    async fn refresh_ha_state(&mut self) -> Result<HaPeerState, CoreError> {
        self.identity.ha_state = query_ha_state(&self.client).await?;
        Ok(self.identity.ha_state)
    }
}

async fn list_vsys(client: &DeviceClient) -> Result<Vec<VsysInfo>, CoreError> {
    let reply = client.restapi_get(VSYS_ROUTE, &[]).await?;
    VsysInfo::from_rest_listing(&reply, client.device_name())
}
