//! Resolve the device to talk to from the config file, the active profile
//! and CLI overrides.

use std::time::Duration;

use panos_config::{Config, DeviceKind, Profile};
use panos_core::{DeviceConfig, TlsMode, TransportConfig};
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// API version assumed when neither a profile nor `--api-version` gives one.
const DEFAULT_API_VERSION: &str = "10.1";

/// Where a device lives, without credentials.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub profile: String,
    pub address: String,
    pub api_version: String,
    pub transport: TransportConfig,
}

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct Target {
    pub profile: String,
    pub kind: DeviceKind,
    pub address: String,
    pub device: DeviceConfig,
    /// Credentials for firewalls managed by a Panorama target.
    pub managed_devices: Option<DeviceConfig>,
    pub transport: TransportConfig,
}

fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(panos_config::load_config(global.config.as_deref())?)
}

/// Build the target from the active profile, or from flags alone when no
/// profile exists and `--host` is given.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let config = load(global)?;

    match config.profile(global.profile.as_deref()) {
        Ok((name, profile)) => from_profile(&config, name, profile, global),
        Err(_) if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: global.profile.clone().unwrap_or_default(),
            available: available_profiles(&config),
        }),
        Err(_) => from_flags(&config, global),
    }
}

/// Address of the active profile (or `--host`) without resolving
/// credentials. Used by `keygen`, which is how credentials get created.
pub fn resolve_endpoint(global: &GlobalOpts) -> Result<Endpoint, CliError> {
    let config = load(global)?;

    match config.profile(global.profile.as_deref()) {
        Ok((name, profile)) => {
            let address = global
                .host
                .clone()
                .or_else(|| profile.address().map(str::to_owned))
                .ok_or_else(|| CliError::Validation {
                    field: "host".into(),
                    reason: format!("profile '{name}' has no host"),
                })?;
            Ok(Endpoint {
                profile: name.to_owned(),
                address,
                api_version: global
                    .api_version
                    .clone()
                    .unwrap_or_else(|| profile.device.api_version.clone()),
                transport: transport(&profile.transport(&config.defaults), global),
            })
        }
        Err(_) if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: global.profile.clone().unwrap_or_default(),
            available: available_profiles(&config),
        }),
        Err(_) => Ok(Endpoint {
            address: global.host.clone().ok_or_else(|| no_config(global))?,
            api_version: global
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned()),
            transport: transport(&default_transport(&config), global),
            profile: config.default_profile,
        }),
    }
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config
        .profiles
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn from_profile(
    config: &Config,
    name: &str,
    profile: &Profile,
    global: &GlobalOpts,
) -> Result<Target, CliError> {
    let mut profile = profile.clone();
    if let Some(ref host) = global.host {
        profile.host = Some(host.clone());
        profile.device.ipv4 = None;
    }
    if let Some(kind) = global.kind {
        profile.kind = kind;
    }
    if let Some(ref key) = global.api_key {
        profile.device.api_key = Some(key.clone().into());
        profile.api_key_env = None;
    }

    let mut device = if global.api_key.is_some() {
        profile.device.clone()
    } else {
        panos_config::profile_device_config(&profile, name)?
    };
    apply_overrides(&mut device, global);

    let address = profile
        .address()
        .map(str::to_owned)
        .ok_or_else(|| CliError::Validation {
            field: "host".into(),
            reason: format!("profile '{name}' has no host"),
        })?;
    if profile.kind == DeviceKind::Panorama {
        device.ipv4 = Some(address.clone());
    }
    debug!(profile = name, kind = %profile.kind, address = %address, "resolved target");

    Ok(Target {
        profile: name.to_owned(),
        kind: profile.kind,
        address,
        device,
        managed_devices: profile.managed_devices.clone(),
        transport: transport(&profile.transport(&config.defaults), global),
    })
}

fn from_flags(config: &Config, global: &GlobalOpts) -> Result<Target, CliError> {
    let address = global.host.clone().ok_or_else(|| no_config(global))?;
    let key = global.api_key.clone().ok_or_else(|| CliError::NoCredentials {
        profile: "(flags)".into(),
    })?;

    let kind = global.kind.unwrap_or_default();
    let mut device = DeviceConfig::new(DEFAULT_API_VERSION).with_api_key(key);
    apply_overrides(&mut device, global);
    if kind == DeviceKind::Panorama {
        device = device.with_ipv4(address.clone());
    }

    Ok(Target {
        profile: "(flags)".into(),
        kind,
        address,
        device,
        managed_devices: None,
        transport: transport(&default_transport(config), global),
    })
}

fn no_config(global: &GlobalOpts) -> CliError {
    CliError::NoConfig {
        path: global
            .config
            .clone()
            .unwrap_or_else(panos_config::config_path)
            .display()
            .to_string(),
    }
}

fn default_transport(config: &Config) -> TransportConfig {
    let tls = if config.defaults.insecure {
        TlsMode::DangerAcceptInvalid
    } else {
        TlsMode::System
    };
    TransportConfig::default()
        .with_tls(tls)
        .with_timeout(Duration::from_secs(config.defaults.timeout))
}

fn apply_overrides(device: &mut DeviceConfig, global: &GlobalOpts) {
    if let Some(ref version) = global.api_version {
        device.api_version.clone_from(version);
    }
    if let Some(delay) = global.request_delay {
        device.requests_delay_seconds = delay;
    }
}

fn transport(base: &TransportConfig, global: &GlobalOpts) -> TransportConfig {
    let mut transport = base.clone();
    if global.insecure {
        transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        transport.timeout = Duration::from_secs(secs);
    }
    transport
}
