#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panos_api::error::CONFIG_LOCK_MARKER;
use panos_api::{
    ConfigAction, Credentials, DeviceClient, Error, ErrorPolicy, Method, RetryPolicy, XmlNode,
    base_url_for,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(policy: ErrorPolicy) -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let mut client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url_for(&server.uri()).unwrap(),
        "10.1",
        Credentials::ApiKey(SecretString::from("test-key".to_owned())),
    )
    .with_request_delay(Duration::ZERO)
    .with_retry(RetryPolicy::gateway().with_backoff(Duration::ZERO));
    client.set_device_name("fw-test");
    client.commit(policy);
    (server, client)
}

fn success(result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(r#"<response status="success"><result>{result}</result></response>"#))
}

// ── Request pipeline ────────────────────────────────────────────────

#[tokio::test]
async fn test_op_request_sends_key_header_and_form() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(header("X-PAN-KEY", "test-key"))
        .and(body_string_contains("type=op"))
        .respond_with(success("<system><hostname>fw1</hostname></system>"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client
        .op_request("<show><system><info></info></system></show>")
        .await
        .unwrap();
    assert_eq!(reply.text_at("result/system/hostname"), Some("fw1"));
}

#[tokio::test]
async fn test_basic_auth_is_used_without_key() {
    let server = MockServer::start().await;
    let mut client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url_for(&server.uri()).unwrap(),
        "10.1",
        Credentials::Basic {
            username: "admin".into(),
            password: SecretString::from("pw".to_owned()),
        },
    )
    .with_request_delay(Duration::ZERO);
    client.commit(ErrorPolicy::Raise);

    // base64("admin:pw")
    Mock::given(method("POST"))
        .and(header("Authorization", "Basic YWRtaW46cHc="))
        .respond_with(success(""))
        .expect(1)
        .mount(&server)
        .await;

    client.op_request("<show/>").await.unwrap();
}

#[tokio::test]
async fn test_config_lock_retries_until_max_attempts() {
    let server = MockServer::start().await;
    let mut client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url_for(&server.uri()).unwrap(),
        "10.1",
        Credentials::ApiKey(SecretString::from("k".to_owned())),
    )
    .with_request_delay(Duration::ZERO)
    .with_retry(RetryPolicy {
        max_attempts: 2,
        backoff: Duration::ZERO,
    });
    client.commit(ErrorPolicy::Log);

    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(format!(
            r#"<response status="error"><msg>{CONFIG_LOCK_MARKER}</msg></response>"#
        )))
        .expect(2)
        .mount(&server)
        .await;

    // Exhausted retries fail even under the log policy.
    let result = client.op_request("<show/>").await;
    let err = result.unwrap_err();
    assert!(err.is_config_lock(), "expected config-lock error, got: {err:?}");
    assert_eq!(err.status_code(), Some(400));
}

#[tokio::test]
async fn test_config_lock_then_success() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(CONFIG_LOCK_MARKER))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(success("<ok/>"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client.op_request("<show/>").await.unwrap();
    assert!(reply.find("result/ok").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_request_delay_precedes_every_attempt() {
    let server = MockServer::start().await;
    let mut client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url_for(&server.uri()).unwrap(),
        "10.1",
        Credentials::ApiKey(SecretString::from("k".to_owned())),
    )
    .with_request_delay(Duration::from_secs(5))
    .with_retry(RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_secs(30),
    });
    client.commit(ErrorPolicy::Raise);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(CONFIG_LOCK_MARKER))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(success("<ok/>"))
        .expect(1)
        .mount(&server)
        .await;

    let started = tokio::time::Instant::now();
    client.op_request("<show/>").await.unwrap();

    // delay + backoff + delay; idle connection-pool timers may only add to it
    assert!(
        started.elapsed() >= Duration::from_secs(40),
        "elapsed {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_bad_status_raises_or_logs() {
    let (server, mut client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"<response status="error"><msg>internal</msg></response>"#,
        ))
        .mount(&server)
        .await;

    let result = client.op_request("<show/>").await;
    assert!(
        matches!(result, Err(Error::Request { status: 500, .. })),
        "expected Request error, got: {result:?}"
    );

    client.set_error_policy(ErrorPolicy::Log);
    let reply = client.op_request("<show/>").await.unwrap();
    assert_eq!(reply.attr("status"), Some("error"));
}

#[tokio::test]
async fn test_bootstrap_phase_never_raises_status_errors() {
    let server = MockServer::start().await;
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        base_url_for(&server.uri()).unwrap(),
        "10.1",
        Credentials::ApiKey(SecretString::from("k".to_owned())),
    )
    .with_request_delay(Duration::ZERO);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="unauth"><msg>Invalid credentials.</msg></response>"#,
        ))
        .mount(&server)
        .await;

    let reply = client.op_request("<show/>").await.unwrap();
    assert_eq!(reply.attr("status"), Some("unauth"));
}

#[tokio::test]
async fn test_unparseable_and_empty_replies() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("POST"))
        .and(body_string_contains("garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<<not xml"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = client.op_request("garbage").await;
    assert!(
        matches!(result, Err(Error::ReplyParsing { status: 200, .. })),
        "expected ReplyParsing, got: {result:?}"
    );

    let result = client.op_request("empty").await;
    assert!(
        matches!(result, Err(Error::EmptyReply { status: 200, .. })),
        "expected EmptyReply, got: {result:?}"
    );
}

#[tokio::test]
async fn test_config_request_serializes_elements() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=config"))
        .and(body_string_contains("action=set"))
        .and(body_string_contains("element=%3Centry+name%3D%22h1%22%3E"))
        .respond_with(success(""))
        .expect(1)
        .mount(&server)
        .await;

    let element = XmlNode::new("entry")
        .with_attr("name", "h1")
        .with_child(XmlNode::with_text("ip-netmask", "10.0.0.1/32"));
    client
        .config_request(ConfigAction::Set, "/config/shared/address", &[element])
        .await
        .unwrap();
}

// ── REST API ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_restapi_request_decodes_json() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("GET"))
        .and(path("/restapi/v10.1/Objects/Addresses"))
        .and(query_param("location", "shared"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@status": "success",
            "result": { "@count": "1", "entry": [{ "@name": "h1" }] }
        })))
        .mount(&server)
        .await;

    let reply = client
        .restapi_get("Objects/Addresses", &[("location", "shared")])
        .await
        .unwrap();
    assert_eq!(reply["result"]["entry"][0]["@name"], "h1");
}

#[tokio::test]
async fn test_restapi_error_msg_follows_policy() {
    let (server, mut client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("POST"))
        .and(path("/restapi/v10.1/Policies/SecurityRules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@status": "error",
            "msg": "Object invalid: name already exists"
        })))
        .mount(&server)
        .await;

    let body = json!({ "entry": { "@name": "r1" } });
    let result = client
        .restapi_request(Method::POST, "Policies/SecurityRules", &[], Some(&body), None)
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, Error::Request { .. }));
    assert_eq!(err.body_json()["@status"], "error");

    client.set_error_policy(ErrorPolicy::Log);
    let reply = client
        .restapi_request(Method::POST, "Policies/SecurityRules", &[], Some(&body), None)
        .await
        .unwrap();
    assert_eq!(reply["@status"], "error");
}

#[tokio::test]
async fn test_restapi_unparseable_json() {
    let (server, client) = setup(ErrorPolicy::Log).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{oops"))
        .mount(&server)
        .await;

    let result = client.restapi_get("Device/VirtualSystems", &[]).await;
    assert!(matches!(result, Err(Error::ReplyParsing { .. })));
}

// ── Export & keygen ─────────────────────────────────────────────────

#[tokio::test]
async fn test_export_file_not_found() {
    let (server, mut client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "export"))
        .and(query_param("category", "configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="error"><msg><line>File not found</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let params = [("category", "configuration"), ("from", "missing.xml")];
    let result = client.export_request(&params, None).await;
    assert!(
        matches!(result, Err(Error::ExportNotFound { .. })),
        "expected ExportNotFound, got: {result:?}"
    );

    // Under the log policy the envelope is handed back untouched.
    client.set_error_policy(ErrorPolicy::Log);
    let reply = client.export_request(&params, None).await.unwrap();
    assert!(reply.body.contains("File not found"));
}

#[tokio::test]
async fn test_export_other_error_is_request_error() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="error"><msg>Access denied</msg></response>"#,
        ))
        .mount(&server)
        .await;

    let result = client.export_request(&[("category", "certificate")], None).await;
    assert!(matches!(result, Err(Error::Request { status: 200, .. })));
}

#[tokio::test]
async fn test_export_returns_raw_body() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("GET"))
        .and(query_param("type", "export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<config version=\"10.1.0\"/>"))
        .mount(&server)
        .await;

    let reply = client
        .export_request(&[("category", "configuration")], None)
        .await
        .unwrap();
    assert_eq!(reply.body, "<config version=\"10.1.0\"/>");
}

#[tokio::test]
async fn test_generate_api_key() {
    let (server, client) = setup(ErrorPolicy::Raise).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "keygen"))
        .and(query_param("user", "admin"))
        .respond_with(success("<key>LUFRPT14MW5xOEo1R09KVlBZNnpnemh0VHRBOWl6TGM9</key>"))
        .mount(&server)
        .await;

    let key = client
        .generate_api_key("admin", &SecretString::from("pw".to_owned()))
        .await
        .unwrap();
    assert_eq!(key.expose_secret(), "LUFRPT14MW5xOEo1R09KVlBZNnpnemh0VHRBOWl6TGM9");
}
