use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::key::{RuleAction, ValueKind, YesNo};

/// A node of the rule document: a string, a list, or a nested mapping.
///
/// Enums and device entries convert into their wire form on the way in,
/// so the document only ever holds these three shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Text(String),
    List(Vec<RuleValue>),
    Map(IndexMap<String, RuleValue>),
}

impl RuleValue {
    pub fn empty_map() -> Self {
        Self::Map(IndexMap::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RuleValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, RuleValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Empty text, list or map.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }

    /// String members of a list value. Non-text items are skipped.
    pub fn texts(&self) -> Vec<&str> {
        self.as_list()
            .map(|items| items.iter().filter_map(Self::as_text).collect())
            .unwrap_or_default()
    }

    /// Equality where lists compare as sets.
    pub fn semantic_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            _ => self == other,
        }
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for RuleValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<RuleAction> for RuleValue {
    fn from(action: RuleAction) -> Self {
        Self::Text(action.to_string())
    }
}

impl From<YesNo> for RuleValue {
    fn from(flag: YesNo) -> Self {
        Self::Text(flag.to_string())
    }
}

impl From<bool> for RuleValue {
    fn from(flag: bool) -> Self {
        let flag = if flag { YesNo::Yes } else { YesNo::No };
        flag.into()
    }
}

impl<T: Into<RuleValue>> From<Vec<T>> for RuleValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RuleValue>, const N: usize> From<[T; N]> for RuleValue {
    fn from(items: [T; N]) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, RuleValue>> for RuleValue {
    fn from(map: IndexMap<String, RuleValue>) -> Self {
        Self::Map(map)
    }
}

// JSON scalars other than strings (REST replies occasionally carry
// numbers or booleans) are kept as their text form.
impl From<serde_json::Value> for RuleValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Text(String::new()),
            Value::Bool(b) => Self::Text(if b { "yes" } else { "no" }.into()),
            Value::Number(n) => Self::Text(n.to_string()),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for RuleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

/// A device in a rule's target list, optionally narrowed to some vsys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDeviceEntry {
    pub serial: String,
    pub vsys: Vec<String>,
}

impl TargetDeviceEntry {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            vsys: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_vsys(mut self, vsys: impl Into<String>) -> Self {
        self.vsys.push(vsys.into());
        self
    }

    /// Read an entry back from its document form.
    pub fn from_value(value: &RuleValue) -> Option<Self> {
        let map = value.as_map()?;
        let serial = map.get("@name")?.as_text()?.to_owned();
        let vsys = map
            .get("vsys")
            .and_then(RuleValue::as_map)
            .and_then(|v| v.get("entry"))
            .and_then(RuleValue::as_list)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.as_map()?.get("@name")?.as_text().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { serial, vsys })
    }
}

impl From<TargetDeviceEntry> for RuleValue {
    fn from(entry: TargetDeviceEntry) -> Self {
        let mut map = IndexMap::new();
        map.insert("@name".to_owned(), RuleValue::Text(entry.serial));
        if !entry.vsys.is_empty() {
            let vsys: Vec<RuleValue> = entry
                .vsys
                .into_iter()
                .map(|name| {
                    RuleValue::Map(IndexMap::from([("@name".to_owned(), RuleValue::Text(name))]))
                })
                .collect();
            map.insert(
                "vsys".to_owned(),
                RuleValue::Map(IndexMap::from([("entry".to_owned(), RuleValue::List(vsys))])),
            );
        }
        RuleValue::Map(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn list_equality_ignores_order() {
        let a = RuleValue::from(["a", "b"]);
        let b = RuleValue::from(["b", "a"]);
        assert!(a.semantic_eq(&b));
        assert_ne!(a, b);
        assert!(!a.semantic_eq(&RuleValue::from(["a"])));
    }

    #[test]
    fn enums_become_wire_strings() {
        assert_eq!(RuleValue::from(RuleAction::Deny), RuleValue::from("deny"));
        assert_eq!(RuleValue::from(true), RuleValue::from("yes"));
    }

    #[test]
    fn target_entry_shape() {
        let entry = TargetDeviceEntry::new("0001").with_vsys("vsys1");
        let value = RuleValue::from(entry.clone());
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"@name": "0001", "vsys": {"entry": [{"@name": "vsys1"}]}})
        );
        assert_eq!(TargetDeviceEntry::from_value(&value), Some(entry));
    }

    #[test]
    fn json_scalars_are_text() {
        let value: RuleValue = serde_json::from_str(r#"{"a": 1, "b": ["x"], "c": null}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], RuleValue::from("1"));
        assert_eq!(map["b"].texts(), vec!["x"]);
        assert_eq!(map["c"], RuleValue::from(""));
    }
}
