use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header PAN-OS reads the pre-shared API key from.
pub const API_KEY_HEADER: &str = "X-PAN-KEY";

/// Which authentication scheme a device uses.
///
/// Marker enum (no data) -- the actual secret material lives in [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Pre-shared API key in the `X-PAN-KEY` header.
    ApiKey,
    /// HTTP basic auth with an admin login.
    Basic,
}

/// Credentials for authenticating with a PAN-OS device.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-shared API key (generated with `type=keygen`).
    ApiKey(SecretString),
    /// Admin login for HTTP basic auth.
    Basic {
        username: String,
        password: SecretString,
    },
}

impl Credentials {
    /// Pick the auth scheme from whatever the device config provides.
    ///
    /// The API key wins when present; otherwise both login and password
    /// are required. Empty strings count as absent.
    pub fn resolve(
        api_key: Option<&SecretString>,
        login: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<Self, Error> {
        if let Some(key) = api_key.filter(|k| !k.expose_secret().is_empty()) {
            return Ok(Self::ApiKey(key.clone()));
        }

        match (
            login.filter(|l| !l.is_empty()),
            password.filter(|p| !p.expose_secret().is_empty()),
        ) {
            (Some(username), Some(password)) => Ok(Self::Basic {
                username: username.to_owned(),
                password: password.clone(),
            }),
            _ => Err(Error::MissingCredentials),
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Self::ApiKey(_) => AuthStrategy::ApiKey,
            Self::Basic { .. } => AuthStrategy::Basic,
        }
    }

    /// Attach these credentials to an outgoing request.
    pub(crate) fn apply(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, Error> {
        match self {
            Self::ApiKey(key) => {
                let mut value = HeaderValue::from_str(key.expose_secret())
                    .map_err(|e| Error::InvalidApiKey(e.to_string()))?;
                value.set_sensitive(true);
                Ok(builder.header(API_KEY_HEADER, value))
            }
            Self::Basic { username, password } => {
                Ok(builder.basic_auth(username, Some(password.expose_secret())))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn api_key_takes_precedence() {
        let key = secret("abc");
        let pw = secret("pw");
        let creds = Credentials::resolve(Some(&key), Some("admin"), Some(&pw)).unwrap();
        assert_eq!(creds.strategy(), AuthStrategy::ApiKey);
    }

    #[test]
    fn falls_back_to_basic() {
        let pw = secret("pw");
        let creds = Credentials::resolve(None, Some("admin"), Some(&pw)).unwrap();
        match creds {
            Credentials::Basic { username, .. } => assert_eq!(username, "admin"),
            Credentials::ApiKey(_) => panic!("expected basic credentials"),
        }
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let key = secret("");
        let pw = secret("pw");
        let creds = Credentials::resolve(Some(&key), Some("admin"), Some(&pw)).unwrap();
        assert_eq!(creds.strategy(), AuthStrategy::Basic);
    }

    #[test]
    fn login_without_password_fails() {
        let result = Credentials::resolve(None, Some("admin"), None);
        assert!(matches!(result, Err(Error::MissingCredentials)));
    }
}
