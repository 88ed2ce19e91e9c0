use thiserror::Error;

/// Marker text PAN-OS puts in the reply body when another admin session
/// holds the configuration lock.
pub const CONFIG_LOCK_MARKER: &str = "Timed out while getting config lock. Please try again.";

/// Top-level error type for the `panos-api` crate.
///
/// Covers every failure mode of the transport layer: credential
/// resolution, HTTP status failures, reply decoding, and export lookups.
/// `panos-core` wraps these into its own `CoreError`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Neither an API key nor a login/password pair was configured.
    #[error("Config must contain ApiKey or Login and Password")]
    MissingCredentials,

    /// The API key contains characters that can't go into an HTTP header.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // ── Request ─────────────────────────────────────────────────────
    /// The device answered with a failure status (non-200 HTTP, an XML
    /// `status="error"` envelope, or an error `msg` in a JSON reply).
    #[error("[{device}] request failed (HTTP {status}): {description}")]
    Request {
        device: String,
        status: u16,
        body: String,
        description: String,
    },

    /// The reply body was present but could not be decoded as JSON/XML.
    #[error("[{device}] failed to parse reply (HTTP {status}): {message}")]
    ReplyParsing {
        device: String,
        status: u16,
        body: String,
        message: String,
    },

    /// The reply body was empty. Usually a dropped connection rather
    /// than a malformed payload.
    #[error("[{device}] empty reply (HTTP {status})")]
    EmptyReply { device: String, status: u16 },

    /// The device reported "file not found" for an export request.
    #[error("[{device}] export failed, file not found: {message}")]
    ExportNotFound { device: String, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// Failed to serialize an XML element for a request payload.
    #[error("XML error: {0}")]
    Xml(#[from] crate::xml::XmlError),

    /// A config element can't be built from the given fields.
    #[error("Invalid element '{name}': {reason}")]
    InvalidElement { name: String, reason: String },
}

impl Error {
    /// Returns `true` if this is a request failure caused by a held
    /// configuration lock.
    pub fn is_config_lock(&self) -> bool {
        matches!(self, Self::Request { body, .. } if body.contains(CONFIG_LOCK_MARKER))
    }

    /// Returns `true` if this is a transient error worth retrying at a
    /// higher level.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::EmptyReply { .. } => true,
            other => other.is_config_lock(),
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. }
            | Self::ReplyParsing { status, .. }
            | Self::EmptyReply { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw reply body carried by the error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Request { body, .. } | Self::ReplyParsing { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Reply body decoded as JSON, or `Value::Null` when it isn't JSON.
    pub fn body_json(&self) -> serde_json::Value {
        self.body()
            .and_then(|b| serde_json::from_str(b).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lock_detection_uses_body_marker() {
        let err = Error::Request {
            device: "fw1".into(),
            status: 400,
            body: format!("<response>{CONFIG_LOCK_MARKER}</response>"),
            description: "bad status code".into(),
        };
        assert!(err.is_config_lock());
        assert!(err.is_transient());
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn body_json_falls_back_to_null() {
        let err = Error::ReplyParsing {
            device: "fw1".into(),
            status: 200,
            body: "not json".into(),
            message: "oops".into(),
        };
        assert_eq!(err.body_json(), serde_json::Value::Null);

        let err = Error::Request {
            device: "fw1".into(),
            status: 403,
            body: r#"{"msg":"unauthorized"}"#.into(),
            description: "status is error".into(),
        };
        assert_eq!(err.body_json()["msg"], "unauthorized");
    }
}
