//! Device sessions, Panorama topology and security-rule documents for
//! PAN-OS, built on `panos-api`.
//!
//! - **[`GatewaySession`]**: A firewall with its identity from `show system info`,
//!   cached HA state, vsys listing.
//!
//! - **[`PanoramaSession`]**: Panorama plus its fleet: managed devices
//!   hydrated as `GatewaySession`s, device groups and their targets, the
//!   device-group hierarchy, and Panorama tag queries.
//!
//! - **[`DeviceSession`]**: What both session kinds share: the client,
//!   identity snapshot, HA refresh, jobs, and rule reads/writes.
//!
//! - **Rule documents** ([`rule`]): [`SecurityRule`] holds one security
//!   rule as a nested document addressed by [`RuleKey`] paths, with
//!   default-aware reads, set-if-different writes, and XML/JSON conversion.
//!
//! Sessions are bootstrapped with errors downgraded to logs, then committed
//! to the caller's [`ErrorPolicy`].

pub mod config;
pub mod error;
pub mod model;
pub mod rule;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::DeviceConfig;
pub use error::CoreError;
pub use model::{DeviceIdentity, HaPeerState, JobInfo, SystemInfo, VsysInfo};
pub use rule::{
    RuleAction, RuleError, RuleKey, RuleValue, SecurityRule, TargetDeviceEntry, YesNo,
    rules_from_json, rules_from_xml,
};
pub use session::{
    DeviceGroup, DeviceGroupHierarchy, DeviceGroupNode, DeviceGroupTarget, DeviceSession,
    GatewayOptions, GatewaySession, HierarchyMap, PanoramaOptions, PanoramaSession,
};

pub use panos_api::{ErrorPolicy, RetryPolicy, TlsMode, TransportConfig};
