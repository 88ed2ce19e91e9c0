// ── Device sessions ──
//
// A session is a `DeviceClient` plus what bootstrap learned about the
// device. Gateways and Panorama share the `DeviceSession` capability set;
// Panorama adds fleet and device-group topology on top.

mod device_group;
mod gateway;
mod hierarchy;
mod panorama;
pub mod tags;

use std::time::Duration;

use panos_api::commands::op;
use panos_api::{ConfigAction, DeviceClient, ErrorPolicy, XmlNode, xpath};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{DeviceIdentity, HaPeerState, JobInfo, SystemInfo};
use crate::rule::{SecurityRule, rules_from_xml};

pub use device_group::{DeviceGroup, DeviceGroupTarget};
pub use gateway::{GatewayOptions, GatewaySession};
pub use hierarchy::{DeviceGroupHierarchy, DeviceGroupNode, HierarchyMap};
pub use panorama::{PanoramaOptions, PanoramaSession};

/// Bootstrap calls get a longer timeout than the transport default because
/// a busy management plane can take a while to answer the first request.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(120);

// ── DeviceSession ────────────────────────────────────────────────

/// Operations every connected PAN-OS device supports.
#[allow(async_fn_in_trait)]
pub trait DeviceSession {
    fn client(&self) -> &DeviceClient;

    fn client_mut(&mut self) -> &mut DeviceClient;

    /// Snapshot of who this session is talking to.
    fn identity(&self) -> DeviceIdentity;

    /// HA state cached at bootstrap or by the last refresh.
    fn ha_peer_state(&self) -> HaPeerState;

    /// Query the device's HA state and update the cache.
    async fn refresh_ha_state(&mut self) -> Result<HaPeerState, CoreError>;

    fn device_name(&self) -> &str {
        self.client().device_name()
    }

    /// Change how request failures are handled from now on.
    fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.client_mut().set_error_policy(policy);
    }

    /// Fresh `show system info`.
    async fn system_info(&self) -> Result<SystemInfo, CoreError> {
        let reply = self.client().op_request(&op::show_system_info()).await?;
        SystemInfo::from_reply(&reply, self.device_name())
    }

    /// Job status, for one job or all of them.
    async fn jobs(&self, job_id: Option<u64>) -> Result<Vec<JobInfo>, CoreError> {
        let reply = self.client().op_request(&op::show_jobs(job_id)).await?;
        Ok(JobInfo::list_from_reply(&reply))
    }

    /// Read the security rules stored under `xpath`.
    async fn security_rules(&self, xpath: &str) -> Result<Vec<SecurityRule>, CoreError> {
        let reply = self
            .client()
            .config_request(ConfigAction::Get, xpath, &[])
            .await?;
        Ok(rules_from_xml(&reply)?)
    }

    /// Write `rule` as an entry under the rules container at `rules_xpath`,
    /// replacing any existing rule of the same name.
    async fn push_security_rule(
        &self,
        rules_xpath: &str,
        rule: &SecurityRule,
    ) -> Result<XmlNode, CoreError> {
        let element = rule.to_xml()?;
        let name = rule.name().unwrap_or_default();
        let xpath = format!("{rules_xpath}/{}", xpath::entry(name));
        debug!(device = self.device_name(), rule = name, "pushing security rule");
        Ok(self
            .client()
            .config_request(ConfigAction::Edit, &xpath, &[element])
            .await?)
    }
}

// ── Shared bootstrap steps ───────────────────────────────────────

pub(crate) async fn query_ha_state(client: &DeviceClient) -> Result<HaPeerState, CoreError> {
    let reply = client.op_request(&op::show_ha_state()).await?;
    HaPeerState::from_reply(&reply, client.device_name())
}

pub(crate) async fn query_system_info(
    client: &DeviceClient,
    timeout: Duration,
) -> Result<SystemInfo, CoreError> {
    let reply = client
        .op_request_with_timeout(&op::show_system_info(), timeout)
        .await?;
    SystemInfo::from_reply(&reply, client.device_name())
}
