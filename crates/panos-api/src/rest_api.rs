// REST API endpoints (`/restapi/v{version}/`)

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::client::{DeviceClient, HttpCall, Payload};
use crate::error::Error;

/// Words in a REST reply's `msg` that mark the request as failed.
const FAILURE_MARKERS: [&str; 3] = ["error", "invalid", "unauth"];

impl DeviceClient {
    /// Call a REST API route and decode the JSON reply.
    ///
    /// A string `msg` containing `error`, `invalid` or `unauth` is a failed
    /// request and goes through the error policy; under
    /// [`ErrorPolicy::Log`](crate::ErrorPolicy) the decoded reply is still
    /// returned.
    pub async fn restapi_request(
        &self,
        method: Method,
        route: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, Error> {
        let url = self.restapi_url(route)?;
        let payload = body.map_or(Payload::None, Payload::Json);
        let call = HttpCall::new(method, &url)
            .query(query)
            .payload(payload)
            .timeout(timeout);
        let reply = self.http_request(call).await?;

        if reply.body.trim().is_empty() {
            return Err(Error::EmptyReply {
                device: self.device_name().to_owned(),
                status: reply.status,
            });
        }
        let json: Value = serde_json::from_str(&reply.body).map_err(|e| Error::ReplyParsing {
            device: self.device_name().to_owned(),
            status: reply.status,
            body: reply.body.clone(),
            message: format!("failed to convert reply to JSON: {e}"),
        })?;

        let failed = json
            .get("msg")
            .and_then(Value::as_str)
            .is_some_and(|msg| FAILURE_MARKERS.iter().any(|m| msg.contains(m)));
        if failed {
            let err = Error::Request {
                device: self.device_name().to_owned(),
                status: reply.status,
                body: reply.body,
                description: "status is error".into(),
            };
            return self.on_failure(err, json);
        }
        Ok(json)
    }

    /// `GET` a REST route with query parameters.
    pub async fn restapi_get(&self, route: &str, query: &[(&str, &str)]) -> Result<Value, Error> {
        self.restapi_request(Method::GET, route, query, None, None)
            .await
    }
}
