// XPath templates for configuration requests.
//
// Every builder returns an owned string; callers concatenate them, e.g.
// `localhost_device_group("DG1") + &rule(RulebaseType::Pre, RuleType::Security, None)`.

use strum::{AsRefStr, Display, EnumString};

/// Which rulebase a rule lives in: the pre/post halves on Panorama, or a
/// firewall's own local rulebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum RulebaseType {
    #[strum(serialize = "pre-rulebase")]
    Pre,
    #[strum(serialize = "post-rulebase")]
    Post,
    #[strum(serialize = "rulebase")]
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RuleType {
    Security,
    Nat,
    Sdwan,
    TunnelInspect,
    Qos,
    Pbf,
    Dos,
    Decryption,
    Authentication,
    ApplicationOverride,
}

/// Configuration object kinds with a fixed location under a device group,
/// vsys, or `shared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ObjectType {
    SecurityPreRule,
    SecurityPostRule,
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Application,
    ApplicationGroup,
    ApplicationFilter,
    Region,
    Schedule,
    LogProfile,
    Profile,
    ProfileGroup,
    Tag,
}

impl ObjectType {
    /// Relative XPath of the object container.
    pub fn xpath(self) -> &'static str {
        match self {
            Self::SecurityPreRule => "/pre-rulebase/security/rules",
            Self::SecurityPostRule => "/post-rulebase/security/rules",
            Self::Address => "/address",
            Self::AddressGroup => "/address-group",
            Self::Service => "/service",
            Self::ServiceGroup => "/service-group",
            Self::Application => "/application",
            Self::ApplicationGroup => "/application-group",
            Self::ApplicationFilter => "/application-filter",
            Self::Region => "/region",
            Self::Schedule => "/schedule",
            Self::LogProfile => "/log-settings/profiles",
            Self::Profile => "/profiles",
            Self::ProfileGroup => "/profile-group",
            Self::Tag => "/tag",
        }
    }

    /// The group kind that collects objects of this kind, if any.
    pub fn group_type(self) -> Option<Self> {
        match self {
            Self::Address => Some(Self::AddressGroup),
            Self::Service => Some(Self::ServiceGroup),
            Self::Application => Some(Self::ApplicationGroup),
            Self::Profile => Some(Self::ProfileGroup),
            _ => None,
        }
    }

    /// The member kind of a group kind, if this is one.
    pub fn member_type(self) -> Option<Self> {
        match self {
            Self::AddressGroup => Some(Self::Address),
            Self::ServiceGroup => Some(Self::Service),
            Self::ApplicationGroup => Some(Self::Application),
            Self::ProfileGroup => Some(Self::Profile),
            _ => None,
        }
    }
}

fn qualify(base: &str, name: Option<&str>) -> String {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => format!("{base}/{}", entry(name)),
        None => base.to_owned(),
    }
}

/// `entry[@name=..]` step for `name`. XPath 1.0 literals have no escapes,
/// so a name holding `'` is double-quoted, and one holding both quote
/// kinds is spliced together with `concat()`.
pub fn entry(name: &str) -> String {
    format!("entry[@name={}]", literal(name))
}

fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

// ── Roots ───────────────────────────────────────────────────────────

pub fn managed_devices() -> String {
    "/config/mgt-config/devices/entry".to_owned()
}

pub fn panorama() -> String {
    "/config/panorama".to_owned()
}

pub fn shared() -> String {
    "/config/shared".to_owned()
}

pub fn predefined() -> String {
    "/config/predefined".to_owned()
}

pub fn this_device() -> String {
    "/config/devices/entry[@name='localhost.localdomain']".to_owned()
}

/// `shared`, `predefined` and `panorama` map to their roots; any other
/// name is taken as a device group on this Panorama.
pub fn location(name: &str) -> String {
    match name {
        "shared" => shared(),
        "predefined" => predefined(),
        "panorama" => panorama(),
        dg => localhost_device_group(Some(dg)),
    }
}

// ── Containers ──────────────────────────────────────────────────────

pub fn device_group(name: Option<&str>) -> String {
    qualify("/device-group", name)
}

pub fn localhost_device_group(name: Option<&str>) -> String {
    format!("{}{}", this_device(), device_group(name))
}

pub fn vsys(name: Option<&str>) -> String {
    qualify("/vsys", name)
}

pub fn panorama_vsys(name: Option<&str>) -> String {
    format!("{}{}", panorama(), vsys(name))
}

// ── Objects & rules ─────────────────────────────────────────────────

pub fn object(object_type: ObjectType, name: Option<&str>) -> String {
    qualify(object_type.xpath(), name)
}

pub fn rule(rulebase: RulebaseType, rule_type: RuleType, name: Option<&str>) -> String {
    qualify(&format!("/{rulebase}/{rule_type}/rules"), name)
}
