// panos-api: Async Rust client for the PAN-OS XML and REST APIs
//
// Transport-level building blocks shared by firewalls and Panorama:
// credentials, TLS/timeout configuration, the request pipeline with
// config-lock retry, XML helpers, op-command and XPath templates.

pub mod auth;
pub mod client;
pub mod commands;
pub mod elements;
pub mod error;
mod rest_api;
pub mod transport;
pub mod xml;
mod xml_api;
pub mod xpath;

pub use auth::{AuthStrategy, Credentials};
pub use client::{DeviceClient, ErrorPolicy, HttpCall, Payload, Phase, RawReply, RetryPolicy, base_url_for};
pub use commands::{ConfigAction, ContentType, RequestType};
pub use elements::{AddressEntry, AddressGroupEntry, AddressGroupMembers, Protocol, ServiceEntry};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use reqwest::Method;
pub use xml::XmlNode;
