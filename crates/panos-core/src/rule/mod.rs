// Security rule documents
//
// A rule is a nested mapping addressed by slash-delimited paths
// ([`RuleKey`]), convertible to and from the XML and REST forms PAN-OS
// uses.

mod builder;
mod document;
mod key;
mod target;
mod value;
mod xml;

use thiserror::Error;

pub use builder::rules_from_json;
pub use document::SecurityRule;
pub use key::{RuleAction, RuleKey, ValueKind, YesNo};
pub use value::{RuleValue, TargetDeviceEntry};
pub use xml::rules_from_xml;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("the rule name can't be changed")]
    NameIsImmutable,

    #[error("'{0}' is not a list")]
    NotAList(RuleKey),

    #[error("'{key}' expects a {expected} value")]
    InvalidValueType { key: RuleKey, expected: ValueKind },

    #[error("'{0}' has no default value")]
    NoDefault(RuleKey),

    #[error("rule has no name")]
    MissingName,

    #[error("invalid rule document: {0}")]
    InvalidDocument(String),

    #[error("rule XML error: {0}")]
    Xml(String),

    #[error("rule JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
