// ── Device configuration record ──
//
// Describes how to reach and authenticate against one device. Loaded from
// YAML/TOML by `panos-config` or built in memory; core never touches disk.
// Keys follow the device-config file format (`ApiKey`, `ApiVersion`, ...)
// and also accept snake_case spellings.

use std::time::Duration;

use panos_api::Credentials;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::CoreError;

/// Connection and credential settings for a gateway or Panorama.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Pre-shared API key. Takes precedence over `login`/`password`.
    #[serde(rename = "ApiKey", alias = "api_key", default, deserialize_with = "secret")]
    pub api_key: Option<SecretString>,

    #[serde(rename = "Login", alias = "login", default)]
    pub login: Option<String>,

    #[serde(rename = "Password", alias = "password", default, deserialize_with = "secret")]
    pub password: Option<SecretString>,

    /// REST API version, e.g. `10.1`.
    #[serde(rename = "ApiVersion", alias = "api_version", deserialize_with = "version")]
    pub api_version: String,

    /// Delay before every request, in (fractional) seconds.
    #[serde(
        rename = "RequestsDelaySeconds",
        alias = "requests_delay_seconds",
        default = "default_delay"
    )]
    pub requests_delay_seconds: f64,

    /// Management address. Required for Panorama, ignored for gateways.
    #[serde(rename = "IPv4", alias = "ipv4", default)]
    pub ipv4: Option<String>,
}

fn default_delay() -> f64 {
    1.0
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(SecretString::from))
}

/// YAML happily reads `ApiVersion: 10.0` as a float; keep the `.0`.
fn version<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Repr::deserialize(d)? {
        Repr::Text(s) => s,
        Repr::Int(i) => i.to_string(),
        Repr::Float(f) => format!("{f:?}"),
    })
}

impl DeviceConfig {
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_key: None,
            login: None,
            password: None,
            api_version: api_version.into(),
            requests_delay_seconds: default_delay(),
            ipv4: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_login(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    pub fn with_ipv4(mut self, address: impl Into<String>) -> Self {
        self.ipv4 = Some(address.into());
        self
    }

    pub fn with_request_delay(mut self, seconds: f64) -> Self {
        self.requests_delay_seconds = seconds;
        self
    }

    /// Resolve the auth scheme: API key first, then login + password.
    /// Having neither is a configuration error.
    pub fn credentials(&self) -> Result<Credentials, CoreError> {
        Credentials::resolve(
            self.api_key.as_ref(),
            self.login.as_deref(),
            self.password.as_ref(),
        )
        .map_err(|e| CoreError::config(e.to_string()))
    }

    /// Request delay as a `Duration`. Negative or non-finite values
    /// disable the delay.
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.requests_delay_seconds).unwrap_or(Duration::ZERO)
    }

    /// Panorama management address.
    pub fn panorama_address(&self) -> Result<&str, CoreError> {
        self.ipv4
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| CoreError::config("Panorama config must contain IPv4"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use panos_api::AuthStrategy;
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_device_file_keys() {
        let cfg: DeviceConfig = serde_json::from_value(json!({
            "ApiKey": "LUFRPT==",
            "ApiVersion": 10.0,
            "RequestsDelaySeconds": 0.5,
            "IPv4": "10.10.10.10"
        }))
        .unwrap();
        assert_eq!(cfg.api_version, "10.0");
        assert_eq!(cfg.request_delay(), Duration::from_millis(500));
        assert_eq!(cfg.panorama_address().unwrap(), "10.10.10.10");
        assert_eq!(cfg.credentials().unwrap().strategy(), AuthStrategy::ApiKey);
    }

    #[test]
    fn accepts_snake_case_and_defaults_delay() {
        let cfg: DeviceConfig = serde_json::from_value(json!({
            "login": "admin",
            "password": "pw",
            "api_version": "10.1"
        }))
        .unwrap();
        assert_eq!(cfg.api_version, "10.1");
        assert_eq!(cfg.request_delay(), Duration::from_secs(1));
        assert_eq!(cfg.credentials().unwrap().strategy(), AuthStrategy::Basic);
    }

    #[test]
    fn missing_credentials_is_config_failure() {
        let cfg = DeviceConfig::new("10.1");
        assert!(matches!(cfg.credentials(), Err(CoreError::Config { .. })));
        // a login without its password is not enough either
        let cfg = DeviceConfig::new("10.1").with_login("admin", "");
        assert!(matches!(cfg.credentials(), Err(CoreError::Config { .. })));
        assert!(matches!(cfg.panorama_address(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn negative_delay_is_zero() {
        let cfg = DeviceConfig::new("10.1").with_request_delay(-1.0);
        assert_eq!(cfg.request_delay(), Duration::ZERO);
    }
}
