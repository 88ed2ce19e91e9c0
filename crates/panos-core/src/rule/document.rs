use indexmap::IndexMap;
use serde_json::json;
use tracing::trace;

use super::RuleError;
use super::key::{PROFILE_GROUP_ROOT, RuleKey, ValueKind};
use super::value::RuleValue;

pub(crate) type Document = IndexMap<String, RuleValue>;

const ANY: &str = "any";

/// A security policy rule held as a nested document.
///
/// Reads go through [`RuleKey`] paths and fall back to the PAN-OS default
/// when a path is absent. Writes only touch the document when the value
/// actually differs, and record that in [`is_modified`](Self::is_modified)
/// so callers can skip pushing unchanged rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecurityRule {
    pub(crate) doc: Document,
    pub(crate) uuid: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) modified: bool,
}

impl SecurityRule {
    /// Wrap an existing document. `@uuid` and `@loc` are lifted out as
    /// metadata and never written back.
    pub fn from_document(value: impl Into<RuleValue>) -> Result<Self, RuleError> {
        let RuleValue::Map(mut doc) = value.into() else {
            return Err(RuleError::InvalidDocument(
                "rule document must be a mapping".into(),
            ));
        };
        let uuid = take_text(&mut doc, "@uuid");
        let location = take_text(&mut doc, "@loc");
        Ok(Self {
            doc,
            uuid,
            location,
            modified: false,
        })
    }

    /// Parse a single rule from its REST (JSON) representation.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let value: RuleValue = serde_json::from_str(json)?;
        Self::from_document(value)
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("@name").and_then(RuleValue::as_text)
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Where the rule is actually defined (`@loc`), e.g. the device group
    /// that owns it.
    pub fn real_location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Mark the rule as in sync with the device, e.g. after pushing it.
    pub fn clear_is_modified_flag(&mut self) {
        self.modified = false;
    }

    /// Device group the rule lives in, or `shared`.
    pub fn device_group(&self) -> String {
        let text = |k: &str| self.doc.get(k).and_then(RuleValue::as_text);
        match (text("@location"), text("@device-group")) {
            (Some("device-group"), Some(group)) => group.to_owned(),
            _ => "shared".to_owned(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Value at `key`, or its default when the path is absent.
    pub fn get(&self, key: RuleKey) -> RuleValue {
        self.lookup(key.path()).cloned().unwrap_or_else(|| key.fallback())
    }

    /// String members of a list key.
    pub fn get_list(&self, key: RuleKey) -> Vec<String> {
        self.get(key).texts().into_iter().map(str::to_owned).collect()
    }

    /// Text of a scalar key, `""` for non-text values.
    pub fn get_text(&self, key: RuleKey) -> String {
        self.get(key).as_text().unwrap_or_default().to_owned()
    }

    /// Whether the path is present in the document.
    pub fn has_key(&self, key: RuleKey) -> bool {
        self.lookup(key.path()).is_some()
    }

    fn lookup(&self, path: &str) -> Option<&RuleValue> {
        let mut segments = path.split('/');
        let mut current = self.doc.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Set `key` to `value` unless the current value is already equal
    /// (lists compare as sets). Returns whether the document changed.
    ///
    /// Duplicate list members are collapsed and `any` is dropped when
    /// other members remain. An empty value never becomes an empty
    /// element: it removes `key` instead, and an empty tag list removes
    /// the whole `tag` node. Writing under `profile-setting/group` removes
    /// `profile-setting/profiles` and the other way round, since PAN-OS
    /// accepts only one of them.
    pub fn set_if_diff(
        &mut self,
        key: RuleKey,
        value: impl Into<RuleValue>,
    ) -> Result<bool, RuleError> {
        if key == RuleKey::RuleName {
            return Err(RuleError::NameIsImmutable);
        }
        let value = match value.into() {
            RuleValue::List(items) if items.is_empty() && key == RuleKey::TagList => {
                return Ok(self.delete(RuleKey::TagRoot));
            }
            RuleValue::List(items) => RuleValue::List(normalize_members(items)),
            other => other,
        };
        if value.is_empty() {
            return Ok(self.delete(key));
        }
        Ok(self.write(key, value))
    }

    /// Union `values` into a list key. `any` is kept as given.
    pub fn append_values<I, V>(&mut self, key: RuleKey, values: I) -> Result<bool, RuleError>
    where
        I: IntoIterator<Item = V>,
        V: Into<RuleValue>,
    {
        if !key.is_list() {
            return Err(RuleError::NotAList(key));
        }
        let additions: Vec<RuleValue> = values.into_iter().map(Into::into).collect();
        if additions.is_empty() {
            return Ok(false);
        }
        let mut merged = match self.get(key) {
            RuleValue::List(items) => items,
            _ => Vec::new(),
        };
        for value in additions {
            if !merged.contains(&value) {
                merged.push(value);
            }
        }
        Ok(self.write(key, RuleValue::List(merged)))
    }

    /// Reset `key` to its declared default.
    pub fn set_default(&mut self, key: RuleKey) -> Result<bool, RuleError> {
        let default = key.declared_default().ok_or(RuleError::NoDefault(key))?;
        self.set_if_diff(key, default)
    }

    /// Remove `key` from the document. Returns whether it was present.
    pub fn delete(&mut self, key: RuleKey) -> bool {
        self.delete_path(key.path())
    }

    fn write(&mut self, key: RuleKey, value: RuleValue) -> bool {
        let path = key.path();
        let changed = self.write_path(path, value);
        let pruned = self.enforce_profile_exclusivity(path);
        self.modified |= changed || pruned;
        changed || pruned
    }

    fn write_path(&mut self, path: &str, value: RuleValue) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };

        let mut map = &mut self.doc;
        for segment in parents {
            let entry = map
                .entry((*segment).to_owned())
                .or_insert_with(RuleValue::empty_map);
            if entry.kind() != ValueKind::Map {
                *entry = RuleValue::empty_map();
            }
            let RuleValue::Map(inner) = entry else {
                return false;
            };
            map = inner;
        }

        if map.get(*last).is_some_and(|current| current.semantic_eq(&value)) {
            return false;
        }
        trace!(path, "rule value changed");
        map.insert((*last).to_owned(), value);
        true
    }

    /// Remove the value at `path`. Parents left empty are removed too.
    pub(crate) fn delete_path(&mut self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        let removed = remove_at(&mut self.doc, &segments);
        self.modified |= removed;
        removed
    }

    fn enforce_profile_exclusivity(&mut self, written: &str) -> bool {
        if written.contains(PROFILE_GROUP_ROOT) {
            self.delete_path(RuleKey::ProfileSettingProfiles.path())
        } else if written.contains(RuleKey::ProfileSettingProfiles.path()) {
            self.delete_path(PROFILE_GROUP_ROOT)
        } else {
            false
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Copy of the document without `@uuid`/`@loc`.
    pub fn to_document(&self) -> IndexMap<String, RuleValue> {
        self.doc.clone()
    }

    /// The document wrapped as the REST API expects it: `{"entry": [doc]}`.
    pub fn to_entry_document(&self) -> serde_json::Value {
        json!({ "entry": [self.doc] })
    }

    pub fn to_json(&self) -> Result<String, RuleError> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    /// Declared shape check used by the bulk builder.
    pub(crate) fn check_kind(key: RuleKey, value: &RuleValue) -> Result<(), RuleError> {
        let expected = key.kind();
        if value.kind() == expected {
            Ok(())
        } else {
            Err(RuleError::InvalidValueType { key, expected })
        }
    }
}

fn take_text(doc: &mut Document, key: &str) -> Option<String> {
    match doc.shift_remove(key) {
        Some(RuleValue::Text(s)) => Some(s),
        _ => None,
    }
}

fn remove_at(map: &mut Document, segments: &[&str]) -> bool {
    match segments {
        [] => false,
        [last] => map.shift_remove(*last).is_some(),
        [head, rest @ ..] => {
            let Some(RuleValue::Map(inner)) = map.get_mut(*head) else {
                return false;
            };
            let removed = remove_at(inner, rest);
            let emptied = inner.is_empty();
            if removed && emptied {
                map.shift_remove(*head);
            }
            removed
        }
    }
}

/// Unique members in first-seen order, without `any` if anything else is
/// left.
fn normalize_members(items: Vec<RuleValue>) -> Vec<RuleValue> {
    let mut unique: Vec<RuleValue> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    if unique.len() > 1 {
        unique.retain(|v| v.as_text() != Some(ANY));
    }
    unique
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::rule::{RuleAction, TargetDeviceEntry};

    fn rule(value: serde_json::Value) -> SecurityRule {
        SecurityRule::from_document(RuleValue::from(value)).unwrap()
    }

    fn as_json(rule: &SecurityRule) -> serde_json::Value {
        serde_json::to_value(rule.to_document()).unwrap()
    }

    #[test]
    fn absent_paths_read_as_defaults() {
        let r = rule(json!({"@name": "r1"}));
        assert_eq!(r.get_list(RuleKey::SourceList), vec!["any"]);
        assert_eq!(r.get_text(RuleKey::Action), "allow");
        assert_eq!(r.get_text(RuleKey::LogEnd), "yes");
        assert!(!r.has_key(RuleKey::SourceList));
        assert_eq!(r.name(), Some("r1"));
    }

    #[test]
    fn metadata_is_lifted_out() {
        let r = rule(json!({"@name": "r1", "@uuid": "u-1", "@loc": "dg1"}));
        assert_eq!(r.uuid(), Some("u-1"));
        assert_eq!(r.real_location(), Some("dg1"));
        assert_eq!(as_json(&r), json!({"@name": "r1"}));
    }

    #[test]
    fn equal_writes_leave_rule_unmodified() {
        let mut r = rule(json!({"@name": "r1", "source": {"member": ["a", "b"]}}));
        assert!(!r.set_if_diff(RuleKey::SourceList, ["b", "a"]).unwrap());
        assert!(!r.is_modified());

        assert!(r.set_if_diff(RuleKey::SourceList, ["c"]).unwrap());
        assert!(r.is_modified());
        assert_eq!(r.get_list(RuleKey::SourceList), vec!["c"]);

        r.clear_is_modified_flag();
        assert!(!r.is_modified());
    }

    #[test]
    fn plain_document_reads_with_defaults() {
        let mut r = rule(json!({"@name": "allow-web", "action": "allow"}));
        assert_eq!(r.get_list(RuleKey::FromZoneList), vec!["any"]);
        assert_eq!(r.get_text(RuleKey::Action), "allow");

        assert!(r.append_values(RuleKey::SourceList, ["10.0.0.1"]).unwrap());
        assert!(r.is_modified());
        let mut source = r.get_list(RuleKey::SourceList);
        source.sort();
        assert_eq!(source, vec!["10.0.0.1", "any"]);
    }

    #[test]
    fn any_is_dropped_next_to_real_members() {
        let mut r = rule(json!({"@name": "r1"}));
        r.set_if_diff(RuleKey::DestinationList, ["any", "10.0.0.1"]).unwrap();
        assert_eq!(r.get_list(RuleKey::DestinationList), vec!["10.0.0.1"]);

        r.set_if_diff(RuleKey::DestinationList, ["any"]).unwrap();
        assert_eq!(r.get_list(RuleKey::DestinationList), vec!["any"]);
    }

    #[test]
    fn duplicate_members_collapse_before_any_is_dropped() {
        let mut r = rule(json!({"@name": "r1", "source": {"member": ["10.0.0.1"]}}));
        assert!(r.set_if_diff(RuleKey::SourceList, ["any", "any"]).unwrap());
        assert_eq!(r.get_list(RuleKey::SourceList), vec!["any"]);

        r.set_if_diff(RuleKey::SourceList, ["a", "any", "a"]).unwrap();
        assert_eq!(r.get_list(RuleKey::SourceList), vec!["a"]);
    }

    #[test]
    fn empty_values_remove_the_key() {
        let mut r = rule(json!({"@name": "r1", "description": "old"}));
        assert!(!r.set_if_diff(RuleKey::SourceList, Vec::<String>::new()).unwrap());
        assert!(!r.set_if_diff(RuleKey::Schedule, "").unwrap());
        assert!(!r.is_modified());
        assert!(!r.has_key(RuleKey::SourceList));
        assert!(!r.has_key(RuleKey::Schedule));

        assert!(r.set_if_diff(RuleKey::Description, "").unwrap());
        assert!(!r.has_key(RuleKey::Description));
        assert!(r.is_modified());
        assert_eq!(as_json(&r), json!({"@name": "r1"}));
    }

    #[test]
    fn name_cannot_be_set() {
        let mut r = rule(json!({"@name": "r1"}));
        assert!(matches!(
            r.set_if_diff(RuleKey::RuleName, "r2"),
            Err(RuleError::NameIsImmutable)
        ));
    }

    #[test]
    fn empty_tag_list_removes_tag_node() {
        let mut r = rule(json!({"@name": "r1", "tag": {"member": ["t1"]}}));
        assert!(r.set_if_diff(RuleKey::TagList, Vec::<String>::new()).unwrap());
        assert!(!r.has_key(RuleKey::TagRoot));
        assert!(r.is_modified());
    }

    #[test]
    fn profile_group_and_profiles_are_exclusive() {
        let mut r = rule(json!({
            "@name": "r1",
            "profile-setting": {"profiles": {"virus": {"member": ["default"]}}}
        }));
        r.set_if_diff(RuleKey::ProfileSettingGroup, ["strict"]).unwrap();
        assert!(!r.has_key(RuleKey::ProfileSettingProfiles));
        assert_eq!(r.get_list(RuleKey::ProfileSettingGroup), vec!["strict"]);

        r.set_if_diff(RuleKey::ProfileSpyware, ["default"]).unwrap();
        assert!(!r.has_key(RuleKey::ProfileSettingGroup));
        assert_eq!(
            as_json(&r)["profile-setting"],
            json!({"profiles": {"spyware": {"member": ["default"]}}})
        );
    }

    #[test]
    fn equal_write_still_prunes_the_other_profile_branch() {
        let mut r = rule(json!({
            "@name": "r1",
            "profile-setting": {
                "group": {"member": ["strict"]},
                "profiles": {"virus": {"member": ["default"]}}
            }
        }));
        assert!(r.set_if_diff(RuleKey::ProfileSettingGroup, ["strict"]).unwrap());
        assert!(!r.has_key(RuleKey::ProfileSettingProfiles));
    }

    #[test]
    fn non_map_intermediate_is_replaced() {
        let mut r = rule(json!({"@name": "r1", "source": "oops"}));
        r.set_if_diff(RuleKey::SourceList, ["a"]).unwrap();
        assert_eq!(as_json(&r)["source"], json!({"member": ["a"]}));
    }

    #[test]
    fn append_takes_the_union() {
        let mut r = rule(json!({"@name": "r1", "tag": {"member": ["a"]}}));
        assert!(r.append_values(RuleKey::TagList, ["a", "b"]).unwrap());
        assert_eq!(r.get_list(RuleKey::TagList), vec!["a", "b"]);
        assert!(!r.append_values(RuleKey::TagList, ["b"]).unwrap());
        assert!(!r.append_values(RuleKey::TagList, Vec::<String>::new()).unwrap());

        // appending to a defaulted list keeps `any`
        r.append_values(RuleKey::SourceList, ["10.0.0.0/8"]).unwrap();
        assert_eq!(r.get_list(RuleKey::SourceList), vec!["any", "10.0.0.0/8"]);
    }

    #[test]
    fn append_rejects_scalar_keys() {
        let mut r = rule(json!({"@name": "r1"}));
        assert!(matches!(
            r.append_values(RuleKey::Description, ["x"]),
            Err(RuleError::NotAList(RuleKey::Description))
        ));
    }

    #[test]
    fn set_default_and_delete() {
        let mut r = rule(json!({"@name": "r1", "action": "deny"}));
        assert!(r.set_default(RuleKey::Action).unwrap());
        assert_eq!(r.get_text(RuleKey::Action), "allow");
        assert!(r.delete(RuleKey::Action));
        assert!(!r.delete(RuleKey::Action));
        assert!(matches!(
            r.set_default(RuleKey::TargetDevices),
            Err(RuleError::NoDefault(RuleKey::TargetDevices))
        ));
    }

    #[test]
    fn enum_and_entry_values_are_normalized() {
        let mut r = rule(json!({"@name": "r1"}));
        r.set_if_diff(RuleKey::Action, RuleAction::ResetBoth).unwrap();
        r.set_if_diff(
            RuleKey::TargetDevicesList,
            vec![TargetDeviceEntry::new("0001").with_vsys("vsys2")],
        )
        .unwrap();
        let doc = as_json(&r);
        assert_eq!(doc["action"], "reset-both");
        assert_eq!(
            doc["target"]["devices"]["entry"],
            json!([{"@name": "0001", "vsys": {"entry": [{"@name": "vsys2"}]}}])
        );
    }

    #[test]
    fn device_group_from_location() {
        let r = rule(json!({"@name": "r1", "@location": "device-group", "@device-group": "dg1"}));
        assert_eq!(r.device_group(), "dg1");
        let r = rule(json!({"@name": "r1", "@location": "shared"}));
        assert_eq!(r.device_group(), "shared");
    }

    #[test]
    fn entry_document_wraps_rule() {
        let r = SecurityRule::from_json(r#"{"@name": "r1", "action": "drop"}"#).unwrap();
        assert_eq!(
            r.to_entry_document(),
            json!({"entry": [{"@name": "r1", "action": "drop"}]})
        );
    }

    #[test]
    fn non_mapping_document_is_rejected() {
        assert!(matches!(
            SecurityRule::from_document(RuleValue::from("x")),
            Err(RuleError::InvalidDocument(_))
        ));
    }
}
