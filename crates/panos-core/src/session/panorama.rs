use std::borrow::Cow;
use std::collections::BTreeSet;
use std::time::Duration;

use indexmap::IndexMap;
use panos_api::commands::op;
use panos_api::{
    ConfigAction, Credentials, DeviceClient, ErrorPolicy, RetryPolicy, TransportConfig, XmlNode,
    base_url_for, xpath,
};
use tracing::{debug, info, warn};

use super::device_group::{DeviceGroup, DeviceGroupTarget};
use super::gateway::GatewaySession;
use super::hierarchy::{DeviceGroupHierarchy, HierarchyMap};
use super::{DEFAULT_INIT_TIMEOUT, DeviceSession, query_ha_state, query_system_info, tags};
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, HaPeerState, VsysInfo};

/// Connection options for Panorama.
#[derive(Debug, Clone)]
pub struct PanoramaOptions {
    /// Error policy applied after bootstrap, to Panorama and to every
    /// managed device built from it.
    pub policy: ErrorPolicy,
    pub init_timeout: Duration,
    /// Discover managed devices during bootstrap.
    pub load_managed_devices: bool,
    /// Credentials and API version for talking to managed devices.
    /// Required to load them.
    pub device_config: Option<DeviceConfig>,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
    /// Retry policy for managed-device clients.
    pub device_retry: RetryPolicy,
}

impl Default for PanoramaOptions {
    fn default() -> Self {
        Self {
            policy: ErrorPolicy::Raise,
            init_timeout: DEFAULT_INIT_TIMEOUT,
            load_managed_devices: true,
            device_config: None,
            transport: TransportConfig::default(),
            retry: RetryPolicy::panorama(),
            device_retry: RetryPolicy::gateway(),
        }
    }
}

/// A connected Panorama with its fleet and device-group topology.
///
/// Topology is read at bootstrap and only refreshed on request
/// ([`refresh_managed_devices`](Self::refresh_managed_devices),
/// [`refresh_device_groups`](Self::refresh_device_groups)). Accessors hand
/// out clones.
#[derive(Debug, Clone)]
pub struct PanoramaSession {
    client: DeviceClient,
    identity: DeviceIdentity,
    policy: ErrorPolicy,
    device_config: Option<DeviceConfig>,
    device_retry: RetryPolicy,
    managed_loaded: bool,
    managed_devices: Vec<GatewaySession>,
    device_groups: Vec<DeviceGroup>,
    hierarchy: DeviceGroupHierarchy,
}

impl PanoramaSession {
    /// Bootstrap: HA state, system info, managed devices (unless
    /// disabled), device groups. The address is the config's `IPv4`.
    pub async fn connect(config: &DeviceConfig, options: PanoramaOptions) -> Result<Self, CoreError> {
        let address = config.panorama_address()?.to_owned();
        let credentials = config.credentials()?;
        let client = DeviceClient::new(
            base_url_for(&address)?,
            config.api_version.clone(),
            credentials,
            &options.transport,
        )?
        .with_request_delay(config.request_delay())
        .with_retry(options.retry);

        let ha_state = query_ha_state(&client).await?;
        let system = query_system_info(&client, options.init_timeout).await?;
        let device_name = system
            .devicename
            .clone()
            .unwrap_or_else(|| system.hostname.clone());

        let mut session = Self {
            client,
            identity: DeviceIdentity {
                address,
                api_version: config.api_version.clone(),
                serial: system.serial,
                hostname: system.hostname,
                device_name: device_name.clone(),
                ha_state,
                multi_vsys: system.multi_vsys,
            },
            policy: options.policy,
            device_config: options.device_config,
            device_retry: options.device_retry,
            managed_loaded: false,
            managed_devices: Vec::new(),
            device_groups: Vec::new(),
            hierarchy: DeviceGroupHierarchy::default(),
        };
        session.client.set_device_name(device_name);

        if options.load_managed_devices {
            session.refresh_managed_devices().await?;
        } else {
            warn!(
                device = %session.identity.device_name,
                "managed devices not loaded; device lookups will fail"
            );
        }
        session.refresh_device_groups().await?;
        session.client.commit(options.policy);

        info!(
            device = %session.identity.device_name,
            serial = %session.identity.serial,
            ha = %session.identity.ha_state,
            managed = session.managed_devices.len(),
            device_groups = session.device_groups.len(),
            "panorama session ready"
        );
        Ok(session)
    }

    pub fn serial(&self) -> &str {
        &self.identity.serial
    }

    pub fn hostname(&self) -> &str {
        &self.identity.hostname
    }

    // ── Managed devices ──────────────────────────────────────────

    /// Rebuild the managed-device list from `show devices connected` and
    /// the tag assignments in `mgt-config`.
    pub async fn refresh_managed_devices(&mut self) -> Result<(), CoreError> {
        let device_config = self.device_config.as_ref().ok_or_else(|| {
            CoreError::config(format!(
                "[{}] loading managed devices needs a device config",
                self.identity.device_name
            ))
        })?;
        let credentials = device_config.credentials()?;

        let connected = self
            .client
            .op_request(&op::show_devices_connected())
            .await?;
        let mgmt = self.fetch_managed_device_config().await?;

        let mut devices = Vec::new();
        for entry in connected.find_all("result/devices/entry") {
            let device = self.managed_device(entry, &mgmt, device_config, &credentials)?;
            debug!(
                device = %device.hostname(),
                serial = %device.serial(),
                "managed device loaded"
            );
            devices.push(device);
        }

        self.managed_devices = devices;
        self.managed_loaded = true;
        Ok(())
    }

    fn managed_device(
        &self,
        entry: &XmlNode,
        mgmt: &XmlNode,
        device_config: &DeviceConfig,
        credentials: &Credentials,
    ) -> Result<GatewaySession, CoreError> {
        let panorama = &self.identity.device_name;
        let serial = entry
            .text_at("serial")
            .ok_or_else(|| CoreError::unexpected(panorama, "connected device without serial"))?;
        let address = entry.text_at("ip-address").ok_or_else(|| {
            CoreError::unexpected(panorama, format!("connected device {serial} has no ip-address"))
        })?;
        let hostname = entry.text_at("hostname").unwrap_or(serial);
        let ha_state = match entry.text_at("ha/state") {
            Some(state) => HaPeerState::parse(state)?,
            None => HaPeerState::NotEnabled,
        };

        let vsys = entry
            .find_all("vsys/entry")
            .into_iter()
            .filter_map(|v| {
                let name = v.attr("name")?;
                let display_name = v.text_at("display-name").unwrap_or(name);
                Some(
                    VsysInfo::new(name, display_name)
                        .with_tags(tags::tags_for_device(mgmt, serial, Some(name))),
                )
            })
            .collect();

        let mut client = DeviceClient::with_client(
            self.client.http_client().clone(),
            base_url_for(address)?,
            device_config.api_version.clone(),
            credentials.clone(),
        )
        .with_request_delay(device_config.request_delay())
        .with_retry(self.device_retry);
        client.set_device_name(hostname);
        client.commit(self.policy);

        let identity = DeviceIdentity {
            address: address.to_owned(),
            api_version: device_config.api_version.clone(),
            serial: serial.to_owned(),
            hostname: hostname.to_owned(),
            device_name: hostname.to_owned(),
            ha_state,
            multi_vsys: entry.text_at("multi-vsys") == Some("yes"),
        };
        Ok(GatewaySession::hydrated(client, identity, vsys))
    }

    pub fn is_managed_devices_loaded(&self) -> bool {
        self.managed_loaded
    }

    pub fn managed_devices(&self) -> Result<Vec<GatewaySession>, CoreError> {
        self.ensure_managed_loaded()?;
        Ok(self.managed_devices.clone())
    }

    pub fn managed_device_by_serial(&self, serial: &str) -> Option<GatewaySession> {
        self.managed_devices
            .iter()
            .find(|d| d.serial() == serial)
            .cloned()
    }

    /// First managed device with this hostname. Hostnames aren't unique
    /// across a fleet.
    pub fn managed_device_by_name(&self, name: &str) -> Option<GatewaySession> {
        self.managed_devices
            .iter()
            .find(|d| d.hostname() == name)
            .cloned()
    }

    fn ensure_managed_loaded(&self) -> Result<(), CoreError> {
        if self.managed_loaded {
            Ok(())
        } else {
            Err(CoreError::ManagedDevicesNotLoaded {
                device: self.identity.device_name.clone(),
            })
        }
    }

    // ── Device groups ────────────────────────────────────────────

    /// Re-read the device-group hierarchy and membership. Members whose
    /// serial isn't a managed device are skipped with a warning (usually
    /// a disconnected firewall).
    pub async fn refresh_device_groups(&mut self) -> Result<(), CoreError> {
        let hierarchy = self.client.op_request(&op::show_dg_hierarchy()).await?;
        self.hierarchy = DeviceGroupHierarchy::from_xml(&hierarchy);

        let listing = self.client.op_request(&op::show_devicegroups()).await?;
        let mut groups = Vec::new();
        for entry in listing.find_all("result/devicegroups/entry") {
            let name = entry.attr("name").unwrap_or_default();
            let targets = if self.managed_loaded {
                self.group_targets(name, entry)
            } else {
                Vec::new()
            };
            groups.push(DeviceGroup::new(name, targets));
        }
        self.device_groups = groups;
        Ok(())
    }

    fn group_targets(&self, group: &str, entry: &XmlNode) -> Vec<DeviceGroupTarget> {
        let mut targets = Vec::new();
        for member in entry.find_all("devices/entry") {
            let Some(serial) = member.text_at("serial").or_else(|| member.attr("name")) else {
                continue;
            };
            let Some(gateway) = self.managed_device_by_serial(serial) else {
                warn!(
                    device = %self.identity.device_name,
                    device_group = group,
                    serial,
                    "device-group member is not connected, skipping"
                );
                continue;
            };

            let vsys = member.find_all("vsys/entry");
            if vsys.is_empty() {
                targets.push(DeviceGroupTarget::new(gateway, None));
            } else {
                for v in vsys {
                    let name = v.attr("name").map(str::to_owned);
                    targets.push(DeviceGroupTarget::new(gateway.clone(), name));
                }
            }
        }
        targets
    }

    pub fn device_group(&self, name: &str) -> Result<DeviceGroup, CoreError> {
        self.device_groups
            .iter()
            .find(|g| g.name() == name)
            .cloned()
            .ok_or_else(|| CoreError::DeviceGroupNotFound {
                name: name.to_owned(),
            })
    }

    pub fn device_groups(&self) -> Vec<DeviceGroup> {
        self.device_groups.clone()
    }

    /// Every group in the hierarchy, depth-first.
    pub fn device_group_names(&self) -> Vec<String> {
        self.hierarchy.names()
    }

    pub fn hierarchy(&self) -> DeviceGroupHierarchy {
        self.hierarchy.clone()
    }

    pub fn hierarchy_map(&self) -> HierarchyMap {
        self.hierarchy.to_map()
    }

    pub fn descendant_group_names(&self, name: &str) -> Vec<String> {
        self.hierarchy.descendants(name)
    }

    pub fn devices_in_group(&self, name: &str) -> Result<Vec<GatewaySession>, CoreError> {
        self.ensure_managed_loaded()?;
        Ok(self.device_group(name)?.gateways())
    }

    /// Devices of every group below `name` (not `name` itself).
    pub fn devices_in_descendant_groups(
        &self,
        name: &str,
    ) -> Result<Vec<GatewaySession>, CoreError> {
        let mut devices = Vec::new();
        for group in self.descendant_group_names(name) {
            devices.extend(self.devices_in_group(&group)?);
        }
        Ok(devices)
    }

    // ── Panorama tags ────────────────────────────────────────────

    /// `/config/mgt-config/devices/entry` as returned by a config get; the
    /// `<result>` element.
    pub async fn fetch_managed_device_config(&self) -> Result<XmlNode, CoreError> {
        let reply = self
            .client
            .config_request(ConfigAction::Get, &xpath::managed_devices(), &[])
            .await?;
        Ok(match reply.child("result") {
            Some(result) => result.clone(),
            None => reply,
        })
    }

    async fn snapshot<'a>(&self, snapshot: Option<&'a XmlNode>) -> Result<Cow<'a, XmlNode>, CoreError> {
        Ok(match snapshot {
            Some(node) => Cow::Borrowed(node),
            None => Cow::Owned(self.fetch_managed_device_config().await?),
        })
    }

    /// Devices carrying `tag`, as `serial` or `serial/vsys`. Pass a
    /// snapshot from [`fetch_managed_device_config`](Self::fetch_managed_device_config)
    /// to avoid another request.
    pub async fn device_serials_with_tag(
        &self,
        tag: &str,
        snapshot: Option<&XmlNode>,
    ) -> Result<BTreeSet<String>, CoreError> {
        let snapshot = self.snapshot(snapshot).await?;
        Ok(tags::serials_with_tag(&snapshot, tag))
    }

    pub async fn tags_by_device(
        &self,
        snapshot: Option<&XmlNode>,
    ) -> Result<IndexMap<String, Vec<String>>, CoreError> {
        let snapshot = self.snapshot(snapshot).await?;
        Ok(tags::tags_by_device(&snapshot))
    }

    /// Tags of one device (or one of its vsys), fetched fresh.
    pub async fn tags_for_device(
        &self,
        serial: &str,
        vsys: Option<&str>,
    ) -> Result<Vec<String>, CoreError> {
        let xpath = format!("{}[@name='{serial}']", xpath::managed_devices());
        let reply = self
            .client
            .config_request(ConfigAction::Get, &xpath, &[])
            .await?;
        Ok(tags::tags_for_device(&reply, serial, vsys))
    }
}

impl DeviceSession for PanoramaSession {
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
