use std::str::FromStr;

use panos_api::XmlNode;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::CoreError;

/// Local unit's role in an HA pair or cluster, as reported by
/// `show high-availability state`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
    Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum HaPeerState {
    PrimaryActive,
    PrimaryPassive,
    SecondaryActive,
    SecondaryPassive,
    Active,
    Passive,
    NonFunc,
    PrimaryNonFunctional,
    SecondaryNonFunctional,
    Init,
    Suspended,
    /// HA is not configured. Managed-device listings report it as an
    /// empty state.
    #[default]
    #[strum(to_string = "not-enabled", serialize = "")]
    NotEnabled,
}

impl HaPeerState {
    /// States in which the unit handles traffic (a standalone unit counts).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Active
                | Self::PrimaryActive
                | Self::SecondaryActive
                | Self::NotEnabled
                | Self::PrimaryNonFunctional
        )
    }

    pub fn is_passive(self) -> bool {
        matches!(
            self,
            Self::Passive
                | Self::PrimaryPassive
                | Self::SecondaryPassive
                | Self::NonFunc
                | Self::SecondaryNonFunctional
        )
    }

    /// Parse a device-reported state string.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_str(raw.trim()).map_err(|_| CoreError::UnknownHaState(raw.to_owned()))
    }

    /// Extract the local state from a `show high-availability state` reply.
    ///
    /// Standalone pairs report `result/local-info/state`, HA cluster groups
    /// `result/group/local-info/state`; both are tried in that order.
    pub fn from_reply(reply: &XmlNode, device: &str) -> Result<Self, CoreError> {
        if reply.text_at("result/enabled") != Some("yes") {
            return Ok(Self::NotEnabled);
        }

        let state = reply
            .text_at("result/local-info/state")
            .or_else(|| reply.text_at("result/group/local-info/state"))
            .ok_or_else(|| CoreError::unexpected(device, "HA is enabled but local state is missing"))?;
        Self::parse(state)
    }
}
