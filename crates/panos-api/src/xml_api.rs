// XML API endpoints (`/api/`)
//
// Every call is a POST with form fields, except exports and key generation
// which PAN-OS only serves over GET.

use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};

use crate::client::{DeviceClient, HttpCall, Payload, RawReply};
use crate::commands::{ConfigAction, RequestType};
use crate::error::Error;
use crate::xml::{self, XmlNode};

impl DeviceClient {
    /// POST form fields to `/api/` and decode the `<response>` envelope.
    ///
    /// A root `status` of `error` or `unauth` is a failed request and goes
    /// through the error policy; under [`ErrorPolicy::Log`](crate::ErrorPolicy)
    /// the envelope is still returned.
    pub async fn xml_api_request(
        &self,
        fields: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<XmlNode, Error> {
        let url = self.api_url()?;
        let call = HttpCall::new(Method::POST, &url)
            .payload(Payload::Form(fields))
            .timeout(timeout);
        let reply = self.http_request(call).await?;
        let root = self.decode_xml(&reply)?;

        if matches!(root.attr("status"), Some("error" | "unauth")) {
            let err = Error::Request {
                device: self.device_name().to_owned(),
                status: reply.status,
                body: reply.body,
                description: "status is error".into(),
            };
            return self.on_failure(err, root);
        }
        Ok(root)
    }

    /// Run a command of the given request type (`type=..&cmd=..`), with any
    /// extra form fields appended.
    pub async fn command_request(
        &self,
        request_type: RequestType,
        cmd: &str,
        extra: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<XmlNode, Error> {
        let mut fields = vec![("type", request_type.as_ref()), ("cmd", cmd)];
        fields.extend_from_slice(extra);
        self.xml_api_request(&fields, timeout).await
    }

    /// Run an operational command (`type=op`).
    pub async fn op_request(&self, cmd: &str) -> Result<XmlNode, Error> {
        self.command_request(RequestType::Op, cmd, &[], None).await
    }

    /// Run an operational command with a per-call timeout.
    pub async fn op_request_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<XmlNode, Error> {
        self.command_request(RequestType::Op, cmd, &[], Some(timeout))
            .await
    }

    /// Read or modify configuration (`type=config`). `elements` are
    /// serialized back to back into the `element` field when non-empty.
    pub async fn config_request(
        &self,
        action: ConfigAction,
        xpath: &str,
        elements: &[XmlNode],
    ) -> Result<XmlNode, Error> {
        let element = xml::write_all(elements)?;
        let mut fields = vec![
            ("type", RequestType::Config.as_ref()),
            ("action", action.as_ref()),
            ("xpath", xpath),
        ];
        if !element.is_empty() {
            fields.push(("element", element.as_str()));
        }
        self.xml_api_request(&fields, None).await
    }

    /// Download a file (`type=export`) and return the raw body.
    ///
    /// Under [`ErrorPolicy::Raise`](crate::ErrorPolicy) a 200 reply that is
    /// an error envelope fails: with [`Error::ExportNotFound`] when the
    /// device says the file doesn't exist, otherwise [`Error::Request`].
    pub async fn export_request(
        &self,
        params: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<RawReply, Error> {
        let url = self.api_url()?;
        let mut query = vec![("type", RequestType::Export.as_ref())];
        query.extend(params.iter().copied().filter(|(k, _)| *k != "type"));
        let call = HttpCall::new(Method::GET, &url)
            .query(&query)
            .timeout(timeout);
        let reply = self.http_request(call).await?;

        if self.error_policy() == crate::ErrorPolicy::Raise && reply.status == 200 {
            if let Ok(root) = xml::parse(&reply.body) {
                if root.attr("status") == Some("error") {
                    return Err(self.export_error(&root, params, reply));
                }
            }
        }
        Ok(reply)
    }

    fn export_error(&self, root: &XmlNode, params: &[(&str, &str)], reply: RawReply) -> Error {
        let msg = root
            .child("msg")
            .map(|m| {
                let nested: Vec<&str> = m.descendants("line").iter().map(|l| l.text()).collect();
                if nested.is_empty() {
                    m.text().to_owned()
                } else {
                    nested.join(" ")
                }
            })
            .unwrap_or_default();
        let message = format!("can't export the file (params: {params:?}): {msg}");

        if message.to_lowercase().contains("file not found") {
            Error::ExportNotFound {
                device: self.device_name().to_owned(),
                message,
            }
        } else {
            Error::Request {
                device: self.device_name().to_owned(),
                status: reply.status,
                body: reply.body,
                description: message,
            }
        }
    }

    /// Generate an API key for `user` (`type=keygen`).
    ///
    /// PAN-OS expires the user's previous key when a new one is issued.
    pub async fn generate_api_key(
        &self,
        user: &str,
        password: &SecretString,
    ) -> Result<SecretString, Error> {
        let url = self.api_url()?;
        let query = [
            ("type", RequestType::Keygen.as_ref()),
            ("user", user),
            ("password", password.expose_secret()),
        ];
        let reply = self
            .http_request(HttpCall::new(Method::GET, &url).query(&query))
            .await?;
        let root = self.decode_xml(&reply)?;

        match root.text_at("result/key") {
            Some(key) if reply.status == 200 => Ok(SecretString::from(key.to_owned())),
            _ => Err(Error::Request {
                device: self.device_name().to_owned(),
                status: reply.status,
                body: reply.body,
                description: "no key in keygen reply".into(),
            }),
        }
    }

    /// Parse a reply body as XML, distinguishing empty bodies from garbage.
    fn decode_xml(&self, reply: &RawReply) -> Result<XmlNode, Error> {
        if reply.body.trim().is_empty() {
            return Err(Error::EmptyReply {
                device: self.device_name().to_owned(),
                status: reply.status,
            });
        }
        xml::parse(&reply.body).map_err(|e| Error::ReplyParsing {
            device: self.device_name().to_owned(),
            status: reply.status,
            body: reply.body.clone(),
            message: format!("failed to convert reply to XML: {e}"),
        })
    }
}
