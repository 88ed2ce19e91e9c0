use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::value::RuleValue;

/// Rule verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RuleAction {
    Allow,
    Deny,
    Drop,
    ResetClient,
    ResetServer,
    ResetBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

/// Coarse shape of a value, used for type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::List => "list",
            Self::Map => "map",
        })
    }
}

/// Addressable attribute of a security rule.
///
/// Each key maps to a slash-delimited path into the rule document. List
/// keys end in `member` (or `entry` for target devices) because that is
/// how PAN-OS nests string lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum RuleKey {
    FromZoneList,
    ToZoneList,
    SourceList,
    SourceUserList,
    DestinationList,
    ServiceList,
    ApplicationList,
    Disabled,
    Action,
    TagRoot,
    TagList,
    GroupTag,
    Schedule,
    Description,
    LogSetting,
    ProfileSetting,
    ProfileSettingProfiles,
    ProfileFileBlocking,
    ProfileVirus,
    ProfileSpyware,
    ProfileVulnerability,
    ProfileWildfireAnalysis,
    ProfileUrlFiltering,
    ProfileDataFiltering,
    ProfileSettingGroup,
    NegateDestination,
    NegateSource,
    RuleName,
    LogStart,
    LogEnd,
    TargetTags,
    TargetTagsList,
    TargetDevices,
    TargetDevicesList,
    TargetNegate,
}

/// Path of the profile-group subtree, the counterpart of
/// [`RuleKey::ProfileSettingProfiles`].
pub(crate) const PROFILE_GROUP_ROOT: &str = "profile-setting/group";

impl RuleKey {
    pub fn path(self) -> &'static str {
        match self {
            Self::FromZoneList => "from/member",
            Self::ToZoneList => "to/member",
            Self::SourceList => "source/member",
            Self::SourceUserList => "source-user/member",
            Self::DestinationList => "destination/member",
            Self::ServiceList => "service/member",
            Self::ApplicationList => "application/member",
            Self::Disabled => "disabled",
            Self::Action => "action",
            Self::TagRoot => "tag",
            Self::TagList => "tag/member",
            Self::GroupTag => "group-tag",
            Self::Schedule => "schedule",
            Self::Description => "description",
            Self::LogSetting => "log-setting",
            Self::ProfileSetting => "profile-setting",
            Self::ProfileSettingProfiles => "profile-setting/profiles",
            Self::ProfileFileBlocking => "profile-setting/profiles/file-blocking/member",
            Self::ProfileVirus => "profile-setting/profiles/virus/member",
            Self::ProfileSpyware => "profile-setting/profiles/spyware/member",
            Self::ProfileVulnerability => "profile-setting/profiles/vulnerability/member",
            Self::ProfileWildfireAnalysis => "profile-setting/profiles/wildfire-analysis/member",
            Self::ProfileUrlFiltering => "profile-setting/profiles/url-filtering/member",
            Self::ProfileDataFiltering => "profile-setting/profiles/data-filtering/member",
            Self::ProfileSettingGroup => "profile-setting/group/member",
            Self::NegateDestination => "negate-destination",
            Self::NegateSource => "negate-source",
            Self::RuleName => "@name",
            Self::LogStart => "log-start",
            Self::LogEnd => "log-end",
            Self::TargetTags => "target/tags",
            Self::TargetTagsList => "target/tags/member",
            Self::TargetDevices => "target/devices",
            Self::TargetDevicesList => "target/devices/entry",
            Self::TargetNegate => "target/negate",
        }
    }

    /// Value PAN-OS assumes when the path is absent. Keys without one
    /// (the name and a few subtree roots) return `None`.
    pub fn declared_default(self) -> Option<RuleValue> {
        let any = || RuleValue::from(["any"]);
        let empty_list = || RuleValue::List(Vec::new());
        Some(match self {
            Self::FromZoneList
            | Self::ToZoneList
            | Self::SourceList
            | Self::SourceUserList
            | Self::DestinationList
            | Self::ServiceList
            | Self::ApplicationList => any(),
            Self::Disabled
            | Self::NegateDestination
            | Self::NegateSource
            | Self::LogStart
            | Self::TargetNegate => YesNo::No.into(),
            Self::LogEnd => YesNo::Yes.into(),
            Self::Action => RuleAction::Allow.into(),
            Self::TagRoot | Self::ProfileSetting => RuleValue::empty_map(),
            Self::GroupTag | Self::Schedule | Self::Description | Self::LogSetting => {
                RuleValue::from("")
            }
            Self::TagList
            | Self::TargetTagsList
            | Self::TargetDevicesList
            | Self::ProfileSettingGroup
            | Self::ProfileFileBlocking
            | Self::ProfileVirus
            | Self::ProfileSpyware
            | Self::ProfileVulnerability
            | Self::ProfileWildfireAnalysis
            | Self::ProfileUrlFiltering
            | Self::ProfileDataFiltering => empty_list(),
            Self::ProfileSettingProfiles
            | Self::RuleName
            | Self::TargetTags
            | Self::TargetDevices => return None,
        })
    }

    /// What `get` returns for an absent path.
    pub(crate) fn fallback(self) -> RuleValue {
        self.declared_default().unwrap_or_else(|| match self {
            Self::RuleName => RuleValue::from(""),
            _ => RuleValue::empty_map(),
        })
    }

    pub fn kind(self) -> ValueKind {
        self.fallback().kind()
    }

    pub fn is_list(self) -> bool {
        self.kind() == ValueKind::List
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
