//! Shared configuration for PAN-OS tools.
//!
//! Named device profiles in a YAML or TOML file, layered with `PANOS_*`
//! environment variables, plus the credential chain (env → keyring →
//! file) that turns a profile into a `panos_core::DeviceConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml, Yaml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::debug;

use panos_core::{DeviceConfig, TlsMode, TransportConfig};

/// Keyring service every secret is stored under.
pub const KEYRING_SERVICE: &str = "panctl";

/// Prefix for environment overrides, e.g. `PANOS_PROFILES__LAB__API_KEY`.
pub const ENV_PREFIX: &str = "PANOS_";

/// Fallback API key for any profile.
pub const API_KEY_ENV: &str = "PANOS_API_KEY";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unsupported config file '{}': expected .yaml, .yml or .toml", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

fn default_profile_name() -> String {
    "default".into()
}

#[derive(Debug, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Skip certificate checks. On by default: management interfaces
    /// usually serve self-signed certificates.
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            insecure: default_insecure(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    120
}
fn default_insecure() -> bool {
    true
}

/// What a profile points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Gateway,
    Panorama,
}

/// A named device profile. The device-config keys (`ApiKey`, `ApiVersion`,
/// `RequestsDelaySeconds`, ...) sit directly on the profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub kind: DeviceKind,

    /// Management address. For Panorama, `IPv4` wins when both are set.
    pub host: Option<String>,

    #[serde(flatten)]
    pub device: DeviceConfig,

    /// Environment variable holding this profile's API key.
    pub api_key_env: Option<String>,

    /// Credentials for firewalls reached through this Panorama.
    pub managed_devices: Option<DeviceConfig>,

    /// PEM bundle to verify the device certificate against.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

impl Profile {
    /// Management address: `host`, or `IPv4` for Panorama profiles.
    pub fn address(&self) -> Option<&str> {
        let ipv4 = self.device.ipv4.as_deref().filter(|a| !a.is_empty());
        let host = self.host.as_deref().filter(|h| !h.is_empty());
        match self.kind {
            DeviceKind::Panorama => ipv4.or(host),
            DeviceKind::Gateway => host.or(ipv4),
        }
    }

    /// HTTP settings, with profile overrides applied over `defaults`.
    pub fn transport(&self, defaults: &Defaults) -> TransportConfig {
        let tls = if self.insecure.unwrap_or(defaults.insecure) {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig::default()
            .with_tls(tls)
            .with_timeout(Duration::from_secs(self.timeout.unwrap_or(defaults.timeout)))
    }
}

impl Config {
    /// Look up `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name.unwrap_or(&self.default_profile);
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.to_owned(),
            })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Platform config path, e.g. `~/.config/panctl/config.toml` on Linux.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "panctl").map_or_else(
        || PathBuf::from(".panctl").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Layer a config file (format picked by extension) with `PANOS_*`
/// environment overrides. A missing file yields an empty layer.
fn figment_for(path: &Path) -> Result<Figment, ConfigError> {
    let figment = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => Figment::new().merge(Yaml::file(path)),
        Some("toml") => Figment::new().merge(Toml::file(path)),
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Load the profile file at `path` (or the platform default).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading config");
    Ok(figment_for(&path)?.extract()?)
}

/// Load a single device-config record (no profiles) from a YAML or TOML
/// file. Environment overrides apply as for [`load_config`].
pub fn load_device_config(path: &Path) -> Result<DeviceConfig, ConfigError> {
    debug!(path = %path.display(), "loading device config");
    Ok(figment_for(path)?.extract()?)
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str, secret: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{secret}"),
    )?)
}

fn keyring_secret(profile_name: &str, secret: &str) -> Option<SecretString> {
    keyring_entry(profile_name, secret)
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

fn non_empty(value: String) -> Option<SecretString> {
    (!value.is_empty()).then(|| SecretString::from(value))
}

/// Resolve the API key for a profile: the profile's `api_key_env`, then
/// `PANOS_API_KEY`, then the keyring, then the file. `env` looks up
/// environment variables.
pub fn resolve_api_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    if let Some(key) = profile
        .api_key_env
        .as_deref()
        .and_then(&env)
        .and_then(non_empty)
    {
        debug!(profile = profile_name, "api key from profile env var");
        return Some(key);
    }
    if let Some(key) = env(API_KEY_ENV).and_then(non_empty) {
        debug!(profile = profile_name, "api key from {API_KEY_ENV}");
        return Some(key);
    }
    if let Some(key) = keyring_secret(profile_name, "api-key") {
        debug!(profile = profile_name, "api key from keyring");
        return Some(key);
    }
    profile
        .device
        .api_key
        .as_ref()
        .filter(|k| !k.expose_secret().is_empty())
        .cloned()
}

/// [`resolve_api_key_with`] against the process environment.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_api_key_with(profile, profile_name, |name| std::env::var(name).ok())
}

/// Build the device config for a profile: API key from the credential
/// chain, password from the keyring when the file has none, and the
/// Panorama address filled in from `host`.
pub fn profile_device_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<DeviceConfig, ConfigError> {
    let mut device = profile.device.clone();
    device.api_key = resolve_api_key(profile, profile_name);

    if device.api_key.is_none() && device.login.is_some() && device.password.is_none() {
        device.password = keyring_secret(profile_name, "password");
    }
    if profile.kind == DeviceKind::Panorama && device.ipv4.is_none() {
        device.ipv4 = profile.host.clone();
    }

    device
        .credentials()
        .map_err(|_| ConfigError::NoCredentials {
            profile: profile_name.to_owned(),
        })?;
    Ok(device)
}

/// Store an API key in the keyring for later [`resolve_api_key`] calls.
pub fn store_api_key(profile_name: &str, key: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "api-key")?.set_password(key.expose_secret())?;
    Ok(())
}
