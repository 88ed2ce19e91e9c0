// ── Domain model ──
//
// Plain value types shared by the sessions and the CLI. Everything here is
// `Clone` so accessors can hand out snapshots.

pub mod ha;
pub mod identity;
pub mod job;
pub mod vsys;

pub use ha::HaPeerState;
pub use identity::{DeviceIdentity, SystemInfo};
pub use job::JobInfo;
pub use vsys::VsysInfo;
