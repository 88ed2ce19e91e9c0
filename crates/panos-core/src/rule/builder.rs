use indexmap::IndexMap;
use serde_json::Value;
use strum::IntoEnumIterator;

use super::RuleError;
use super::document::SecurityRule;
use super::key::{PROFILE_GROUP_ROOT, RuleKey};
use super::value::RuleValue;

impl SecurityRule {
    /// Build a new rule from `(key, value)` pairs.
    ///
    /// Every key that isn't supplied gets its declared default, then the
    /// supplied values are written on top. [`RuleKey::RuleName`] is
    /// required. Whichever security-profile branch (group or individual
    /// profiles) the caller supplied is the one that survives.
    pub fn from_pairs<I, V>(pairs: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (RuleKey, V)>,
        V: Into<RuleValue>,
    {
        let mut supplied: IndexMap<RuleKey, RuleValue> =
            pairs.into_iter().map(|(k, v)| (k, v.into())).collect();

        let name = match supplied.shift_remove(&RuleKey::RuleName) {
            Some(RuleValue::Text(name)) if !name.is_empty() => name,
            _ => return Err(RuleError::MissingName),
        };
        for (key, value) in &supplied {
            Self::check_kind(*key, value)?;
        }

        let mut rule = Self::from_document(IndexMap::from([(
            "@name".to_owned(),
            RuleValue::Text(name),
        )]))?;

        for key in RuleKey::iter().filter(|k| !supplied.contains_key(k)) {
            if let Some(default) = key.declared_default() {
                rule.set_if_diff(key, default)?;
            }
        }
        for (key, value) in supplied.iter().filter(|(k, _)| **k != RuleKey::RuleName) {
            rule.set_if_diff(*key, value.clone())?;
        }

        let touched = |needle: &str| supplied.keys().any(|k| k.path().contains(needle));
        if touched(PROFILE_GROUP_ROOT) {
            rule.delete(RuleKey::ProfileSettingProfiles);
        } else if touched(RuleKey::ProfileSettingProfiles.path()) {
            rule.delete_path(PROFILE_GROUP_ROOT);
        }
        Ok(rule)
    }
}

/// Rules from a REST listing (`{"result": {"entry": [..]}}`). A single
/// entry may come back as an object instead of a one-element array.
pub fn rules_from_json(reply: &Value) -> Result<Vec<SecurityRule>, RuleError> {
    let entries = reply
        .pointer("/result/entry")
        .or_else(|| reply.get("entry"));
    match entries {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| SecurityRule::from_document(RuleValue::from(item.clone())))
            .collect(),
        Some(item @ Value::Object(_)) => {
            Ok(vec![SecurityRule::from_document(RuleValue::from(item.clone()))?])
        }
        _ => Ok(Vec::new()),
    }
}
