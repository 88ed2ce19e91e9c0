// ── Core error types ──
//
// Configuration and topology errors always surface. Transport failures
// arrive wrapped in `Api` and have already been through the session's
// error policy by the time they get here.

use thiserror::Error;

use crate::rule::RuleError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] panos_api::Error),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Device replies ───────────────────────────────────────────────
    #[error("[{device}] unexpected reply: {message}")]
    UnexpectedReply { device: String, message: String },

    #[error("Unknown HA state: '{0}'")]
    UnknownHaState(String),

    // ── Topology ─────────────────────────────────────────────────────
    #[error("Device group not present: {name}")]
    DeviceGroupNotFound { name: String },

    #[error("[{device}] managed devices were not loaded; connect with load_managed_devices enabled")]
    ManagedDevicesNotLoaded { device: String },

    // ── Rule documents ───────────────────────────────────────────────
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl CoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn unexpected(device: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            device: device.to_owned(),
            message: message.into(),
        }
    }
}
