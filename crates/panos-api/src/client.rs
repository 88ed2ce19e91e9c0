// PAN-OS device HTTP client
//
// Owns the reqwest client, the device base URL and credentials, and runs
// every request through the same pipeline: request delay, auth, send,
// config-lock retry, then raise-or-log on failure. The XML API and REST
// API helpers live in `xml_api.rs` and `rest_api.rs` as inherent methods.

use std::time::Duration;

use reqwest::Method;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::{CONFIG_LOCK_MARKER, Error};
use crate::transport::TransportConfig;

/// What happens when the device reports a failed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Surface the failure as an [`Error`].
    #[default]
    Raise,
    /// Log the failure with `error!` and hand the reply back to the caller.
    Log,
}

/// Lifecycle of a client's error handling.
///
/// A client starts in `Bootstrap`, where device-reported failures are only
/// logged, and moves to `Committed` once session setup is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Bootstrap,
    Committed(ErrorPolicy),
}

/// Config-lock retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total HTTP attempts, including the first.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(30);

    pub fn gateway() -> Self {
        Self {
            max_attempts: 4,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }

    pub fn panorama() -> Self {
        Self {
            max_attempts: 3,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::gateway()
    }
}

/// Undecoded device reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// Payload of a single HTTP call.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    None,
    /// URL-encoded form body (XML API `POST`).
    Form(&'a [(&'a str, &'a str)]),
    /// JSON body (REST API).
    Json(&'a serde_json::Value),
}

/// One HTTP call as seen by [`DeviceClient::http_request`].
#[derive(Debug, Clone)]
pub struct HttpCall<'a> {
    pub method: Method,
    pub url: &'a Url,
    pub query: &'a [(&'a str, &'a str)],
    pub payload: Payload<'a>,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
}

impl<'a> HttpCall<'a> {
    pub fn new(method: Method, url: &'a Url) -> Self {
        Self {
            method,
            url,
            query: &[],
            payload: Payload::None,
            timeout: None,
        }
    }

    pub fn query(mut self, query: &'a [(&'a str, &'a str)]) -> Self {
        self.query = query;
        self
    }

    pub fn payload(mut self, payload: Payload<'a>) -> Self {
        self.payload = payload;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Normalize a management address into the device base URL.
///
/// Bare hosts (`10.0.0.1`, `fw.example.net:4443`) get `https://`; anything
/// that already carries a scheme is used as is.
pub fn base_url_for(address: &str) -> Result<Url, Error> {
    let raw = if address.contains("://") {
        address.to_owned()
    } else {
        format!("https://{address}")
    };
    let mut url = Url::parse(&raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Authenticated client for one PAN-OS device.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted,
/// so managed devices hydrated from Panorama each carry their own copy.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    api_version: String,
    device_name: String,
    credentials: Credentials,
    request_delay: Duration,
    retry: RetryPolicy,
    phase: Phase,
}

impl DeviceClient {
    /// Create a client in the bootstrap phase.
    pub fn new(
        base_url: Url,
        api_version: impl Into<String>,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, api_version, credentials))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        api_version: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let device_name = base_url.host_str().unwrap_or("unknown").to_owned();
        Self {
            http,
            base_url,
            api_version: api_version.into(),
            device_name,
            credentials,
            request_delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
            phase: Phase::Bootstrap,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The pooled HTTP client, for building sibling clients that share
    /// connections and TLS settings.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Name used to tag log lines and errors; the host until the session
    /// learns the device's hostname.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn set_device_name(&mut self, name: impl Into<String>) {
        self.device_name = name.into();
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    // ── Error policy ─────────────────────────────────────────────────

    /// Leave the bootstrap phase and start applying `policy`.
    pub fn commit(&mut self, policy: ErrorPolicy) {
        debug!(device = %self.device_name, ?policy, "bootstrap complete");
        self.phase = Phase::Committed(policy);
    }

    /// Change the policy of a committed client. Has no effect before
    /// [`commit`](Self::commit): bootstrap always logs.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        if let Phase::Committed(current) = &mut self.phase {
            *current = policy;
        }
    }

    /// Policy currently applied to device-reported failures.
    pub fn error_policy(&self) -> ErrorPolicy {
        match self.phase {
            Phase::Bootstrap => ErrorPolicy::Log,
            Phase::Committed(policy) => policy,
        }
    }

    /// Raise `err` or log it and return `fallback`, per the current policy.
    pub(crate) fn on_failure<T>(&self, err: Error, fallback: T) -> Result<T, Error> {
        match self.error_policy() {
            ErrorPolicy::Raise => Err(err),
            ErrorPolicy::Log => {
                error!("[{}]: {err}", self.device_name);
                Ok(fallback)
            }
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/`
    pub(crate) fn api_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join("api/")?)
    }

    /// `{base}/restapi/v{version}/{route}`
    pub(crate) fn restapi_url(&self, route: &str) -> Result<Url, Error> {
        let route = route.trim_start_matches('/');
        Ok(self
            .base_url
            .join(&format!("restapi/v{}/{route}", self.api_version))?)
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Send one logical request, retrying while the config lock is held.
    ///
    /// Every attempt waits for the request delay first. Non-200 replies
    /// carrying the config-lock marker are retried after the backoff until
    /// `max_attempts` is reached, then fail regardless of policy. Any other
    /// non-200 reply goes through the error policy.
    pub async fn http_request(&self, call: HttpCall<'_>) -> Result<RawReply, Error> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            debug!("{} {}", call.method, call.url);
            let resp = self.build(&call)?.send().await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;

            if status == 200 {
                return Ok(RawReply { status, body });
            }

            if body.contains(CONFIG_LOCK_MARKER) {
                if attempt >= max_attempts {
                    return Err(Error::Request {
                        device: self.device_name.clone(),
                        status,
                        body,
                        description: format!("config lock still held after {attempt} attempts"),
                    });
                }
                warn!(
                    "[{}]: timed out while getting config lock, retrying in {:?} (attempt {attempt}/{max_attempts})",
                    self.device_name, self.retry.backoff
                );
                tokio::time::sleep(self.retry.backoff).await;
                continue;
            }

            let err = Error::Request {
                device: self.device_name.clone(),
                status,
                body: body.clone(),
                description: "bad status code".into(),
            };
            return self.on_failure(err, RawReply { status, body });
        }
    }

    fn build(&self, call: &HttpCall<'_>) -> Result<reqwest::RequestBuilder, Error> {
        let mut builder = self.http.request(call.method.clone(), call.url.clone());
        if !call.query.is_empty() {
            builder = builder.query(call.query);
        }
        builder = match call.payload {
            Payload::None => builder,
            Payload::Form(fields) => builder.form(fields),
            Payload::Json(body) => builder.json(body),
        };
        if let Some(timeout) = call.timeout {
            builder = builder.timeout(timeout);
        }
        self.credentials.apply(builder)
    }
}
