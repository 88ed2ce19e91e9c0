use panos_api::XmlNode;
use serde::Serialize;

use super::ha::HaPeerState;
use crate::error::CoreError;

/// Who a session is talking to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    /// Management address used for requests.
    pub address: String,
    pub api_version: String,
    pub serial: String,
    pub hostname: String,
    /// Name used in logs and lookups. Gateways use their hostname,
    /// Panorama its configured `devicename`.
    pub device_name: String,
    /// Cached at bootstrap; refreshed only on request.
    pub ha_state: HaPeerState,
    pub multi_vsys: bool,
}

/// Fields of `show system info` the sessions rely on, plus a few that are
/// handy for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub devicename: Option<String>,
    pub serial: String,
    pub multi_vsys: bool,
    pub model: Option<String>,
    pub sw_version: Option<String>,
    pub ip_address: Option<String>,
    pub uptime: Option<String>,
}

impl SystemInfo {
    pub fn from_reply(reply: &XmlNode, device: &str) -> Result<Self, CoreError> {
        let system = reply
            .find("result/system")
            .ok_or_else(|| CoreError::unexpected(device, "system info reply has no result/system"))?;
        let required = |field: &str| {
            system
                .text_at(field)
                .map(str::to_owned)
                .ok_or_else(|| CoreError::unexpected(device, format!("system info is missing {field}")))
        };
        let optional = |field: &str| system.text_at(field).map(str::to_owned);

        Ok(Self {
            hostname: required("hostname")?,
            devicename: optional("devicename"),
            serial: required("serial")?,
            multi_vsys: system.text_at("multi-vsys") == Some("on"),
            model: optional("model"),
            sw_version: optional("sw-version"),
            ip_address: optional("ip-address"),
            uptime: optional("uptime"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_system_block() {
        let reply = panos_api::xml::parse(
            "<response status=\"success\"><result><system>\
             <hostname>fw1</hostname><serial>0011</serial><multi-vsys>on</multi-vsys>\
             <model>PA-5260</model><sw-version>10.1.5</sw-version>\
             </system></result></response>",
        )
        .unwrap();
        let info = SystemInfo::from_reply(&reply, "fw").unwrap();
        assert_eq!(info.hostname, "fw1");
        assert!(info.multi_vsys);
        assert_eq!(info.model.as_deref(), Some("PA-5260"));
        assert_eq!(info.devicename, None);
    }

    #[test]
    fn missing_serial_is_unexpected() {
        let reply = panos_api::xml::parse(
            "<response><result><system><hostname>fw1</hostname></system></result></response>",
        )
        .unwrap();
        assert!(matches!(
            SystemInfo::from_reply(&reply, "fw"),
            Err(CoreError::UnexpectedReply { .. })
        ));
    }
}
