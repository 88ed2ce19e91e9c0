// Request-type and config-action vocabulary plus operational command
// templates for the XML API.

use strum::{AsRefStr, Display, EnumString};

/// Value of the XML API `type=` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RequestType {
    Keygen,
    Config,
    Commit,
    Op,
    Report,
    Log,
    Import,
    Export,
    UserId,
    Version,
}

/// Value of the XML API `action=` parameter for `type=config` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigAction {
    /// Active (running) configuration.
    Show,
    /// Candidate configuration.
    Get,
    /// Merge into the candidate configuration.
    Set,
    /// Replace a node of the candidate configuration.
    Edit,
    Delete,
    Rename,
    Clone,
    Move,
    Override,
    MultiMove,
    MultiClone,
    Complete,
}

/// Content package families for Panorama batch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ContentType {
    AntiVirus,
    Wildfire,
    Content,
}

/// Operational command strings (`type=op&cmd=...`).
pub mod op {
    use super::ContentType;

    pub fn show_system_info() -> String {
        "<show><system><info></info></system></show>".to_owned()
    }

    pub fn show_ha_state() -> String {
        "<show><high-availability><state></state></high-availability></show>".to_owned()
    }

    /// Panorama only.
    pub fn show_devices_connected() -> String {
        "<show><devices><connected></connected></devices></show>".to_owned()
    }

    /// Panorama only.
    pub fn show_devices_all() -> String {
        "<show><devices><all></all></devices></show>".to_owned()
    }

    /// Panorama only.
    pub fn show_devicegroups() -> String {
        "<show><devicegroups></devicegroups></show>".to_owned()
    }

    /// Panorama only.
    pub fn show_dg_hierarchy() -> String {
        "<show><dg-hierarchy></dg-hierarchy></show>".to_owned()
    }

    /// A single job when `job_id` is given, otherwise every job.
    pub fn show_jobs(job_id: Option<u64>) -> String {
        match job_id {
            Some(id) => format!("<show><jobs><id>{id}</id></jobs></show>"),
            None => "<show><jobs><all></all></jobs></show>".to_owned(),
        }
    }

    pub fn set_user_id_data() -> String {
        "<set><user-id><data></data></user-id></set>".to_owned()
    }

    /// Panorama only.
    pub fn request_batch_info(content: ContentType) -> String {
        format!("<request><batch><{content}><info></info></{content}></batch></request>")
    }

    /// Panorama only. Pushes a content package to one managed device.
    pub fn request_batch_upload_install(
        content: ContentType,
        file_name: &str,
        device_serial: &str,
        uploaded_file: bool,
    ) -> String {
        let file_tag = if uploaded_file { "uploaded-file" } else { "file" };
        format!(
            "<request><batch><{content}><upload-install><{file_tag}>{file_name}</{file_tag}>\
             <devices>{device_serial}</devices></upload-install></{content}></batch></request>"
        )
    }
}
