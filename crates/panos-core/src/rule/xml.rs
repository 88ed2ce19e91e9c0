// Rule <-> XML element mapping
//
// PAN-OS lists are repeated `<member>` (strings) or `<entry name=..>`
// (named objects) children. Attributes map to `@`-prefixed keys.

use indexmap::IndexMap;
use panos_api::{XmlNode, xml};

use super::RuleError;
use super::document::{Document, SecurityRule};
use super::target::{emit_target, parse_target};
use super::value::RuleValue;

const LIST_TAGS: [&str; 2] = ["member", "entry"];

/// Keys that only exist in REST replies and are rejected by the XML API.
const REST_ONLY_KEYS: [&str; 3] = ["@name", "@location", "@device-group"];

/// Candidate-config replies tag every edited node with these. They describe
/// the pending edit, not the rule.
const EDIT_ATTRIBUTES: [&str; 3] = ["admin", "dirtyId", "time"];

fn rule_attributes(node: &XmlNode) -> impl Iterator<Item = (&String, &String)> {
    node.attributes
        .iter()
        .filter(|(key, _)| !EDIT_ATTRIBUTES.contains(&key.as_str()))
}

impl SecurityRule {
    /// Parse a rule from an `<entry>` element, or from the first `<entry>`
    /// below `node`.
    pub fn from_xml(node: &XmlNode) -> Result<Self, RuleError> {
        let entry = if node.tag == "entry" {
            node
        } else {
            node.descendants("entry")
                .into_iter()
                .next()
                .ok_or_else(|| RuleError::InvalidDocument("no <entry> element".into()))?
        };

        let mut rule = Self::default();
        for (key, value) in rule_attributes(entry) {
            match key.as_str() {
                "uuid" => rule.uuid = Some(value.clone()),
                "loc" => rule.location = Some(value.clone()),
                _ => {
                    rule.doc.insert(format!("@{key}"), RuleValue::from(value));
                }
            }
        }
        for child in entry.children.iter().filter(|c| c.tag != "target") {
            insert_child(&mut rule.doc, child);
        }
        if let Some(target) = entry.child("target") {
            rule.doc.insert("target".to_owned(), parse_target(target));
        }
        Ok(rule)
    }

    pub fn from_xml_str(text: &str) -> Result<Self, RuleError> {
        let node = xml::parse(text).map_err(|e| RuleError::Xml(e.to_string()))?;
        Self::from_xml(&node)
    }

    /// Build the `<entry name="..">` element for the XML API.
    pub fn to_xml(&self) -> Result<XmlNode, RuleError> {
        let mut doc = self.doc.clone();
        let name = match doc.get("@name") {
            Some(RuleValue::Text(name)) if !name.is_empty() => name.clone(),
            _ => return Err(RuleError::MissingName),
        };
        for key in REST_ONLY_KEYS {
            doc.shift_remove(key);
        }
        let target = doc.shift_remove("target");

        let mut entry = XmlNode::new("entry").with_attr("name", name);
        emit_fields(&mut entry, &doc);
        if let Some(node) = target.as_ref().and_then(emit_target) {
            entry.children.push(node);
        }
        Ok(entry)
    }

    pub fn to_xml_string(&self) -> Result<String, RuleError> {
        xml::write(&self.to_xml()?).map_err(|e| RuleError::Xml(e.to_string()))
    }
}

/// Every top-level `<entry>` below `node` as a rule. Entries nested inside
/// a rule (target devices, vsys) are not rules and are skipped.
pub fn rules_from_xml(node: &XmlNode) -> Result<Vec<SecurityRule>, RuleError> {
    let mut entries = Vec::new();
    collect_entries(node, &mut entries);
    entries.into_iter().map(SecurityRule::from_xml).collect()
}

fn collect_entries<'a>(node: &'a XmlNode, out: &mut Vec<&'a XmlNode>) {
    for child in &node.children {
        if child.tag == "entry" {
            out.push(child);
        } else {
            collect_entries(child, out);
        }
    }
}

/// Leaves with text stay text, whatever attributes they carry.
fn node_value(node: &XmlNode) -> RuleValue {
    let mut attributes = rule_attributes(node).peekable();
    if node.children.is_empty() && (!node.text().is_empty() || attributes.peek().is_none()) {
        return RuleValue::from(node.text());
    }
    let mut map = IndexMap::new();
    for (key, value) in attributes {
        map.insert(format!("@{key}"), RuleValue::from(value));
    }
    for child in &node.children {
        insert_child(&mut map, child);
    }
    RuleValue::Map(map)
}

fn insert_child(map: &mut Document, child: &XmlNode) {
    let value = node_value(child);
    if !LIST_TAGS.contains(&child.tag.as_str()) {
        map.insert(child.tag.clone(), value);
        return;
    }
    match map.get_mut(&child.tag) {
        Some(RuleValue::List(items)) => items.push(value),
        _ => {
            map.insert(child.tag.clone(), RuleValue::List(vec![value]));
        }
    }
}

fn emit_fields(parent: &mut XmlNode, map: &Document) {
    for (key, value) in map {
        if let Some(attr) = key.strip_prefix('@') {
            if let RuleValue::Text(text) = value {
                parent.attributes.insert(attr.to_owned(), text.clone());
            }
            continue;
        }
        emit_value(parent, key, value);
    }
}

fn emit_value(parent: &mut XmlNode, tag: &str, value: &RuleValue) {
    match value {
        RuleValue::Text(text) if text.is_empty() => parent.children.push(XmlNode::new(tag)),
        RuleValue::Text(text) => parent.children.push(XmlNode::with_text(tag, text)),
        RuleValue::List(items) if LIST_TAGS.contains(&tag) => {
            for item in items {
                emit_value(parent, tag, item);
            }
        }
        RuleValue::List(items) => {
            let mut wrapper = XmlNode::new(tag);
            for item in items {
                emit_value(&mut wrapper, "member", item);
            }
            parent.children.push(wrapper);
        }
        RuleValue::Map(map) => {
            let mut node = XmlNode::new(tag);
            emit_fields(&mut node, map);
            parent.children.push(node);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::rule::RuleKey;

    const RULE: &str = r#"<entry name="allow-web" uuid="1111-2222" loc="dg1">
        <from><member>trust</member></from>
        <to><member>untrust</member></to>
        <source><member>10.0.0.0/8</member><member>192.168.0.0/16</member></source>
        <destination><member>any</member></destination>
        <application><member>web-browsing</member></application>
        <service><member>application-default</member></service>
        <action>allow</action>
        <description/>
        <profile-setting><group><member>strict</member></group></profile-setting>
        <target><negate>no</negate><devices><entry name="0001"><vsys><entry name="vsys1"/></vsys></entry></devices></target>
    </entry>"#;

    #[test]
    fn parses_rule_entry() {
        let rule = SecurityRule::from_xml_str(RULE).unwrap();
        assert_eq!(rule.name(), Some("allow-web"));
        assert_eq!(rule.uuid(), Some("1111-2222"));
        assert_eq!(rule.real_location(), Some("dg1"));
        assert!(!rule.is_modified());
        assert_eq!(
            rule.get_list(RuleKey::SourceList),
            vec!["10.0.0.0/8", "192.168.0.0/16"]
        );
        assert_eq!(rule.get_text(RuleKey::Description), "");
        assert_eq!(rule.get_list(RuleKey::ProfileSettingGroup), vec!["strict"]);
        assert_eq!(rule.target_devices()[0].vsys, vec!["vsys1"]);
        assert!(!rule.target_negated());
    }

    #[test]
    fn xml_round_trip_keeps_document() {
        let rule = SecurityRule::from_xml_str(RULE).unwrap();
        let again = SecurityRule::from_xml(&rule.to_xml().unwrap()).unwrap();
        let mut expected = rule.to_document();
        // default negate is not written back
        if let Some(RuleValue::Map(target)) = expected.get_mut("target") {
            target.shift_remove("negate");
        }
        assert_eq!(again.to_document(), expected);
    }

    #[test]
    fn emits_member_lists_and_attributes() {
        let rule = SecurityRule::from_document(RuleValue::from(json!({
            "@name": "r1",
            "@location": "device-group",
            "@device-group": "dg1",
            "source": {"member": ["a", "b"]},
            "category": ["any"],
            "log-end": "yes",
        })))
        .unwrap();
        assert_eq!(
            rule.to_xml_string().unwrap(),
            concat!(
                r#"<entry name="r1"><source><member>a</member><member>b</member></source>"#,
                r"<category><member>any</member></category><log-end>yes</log-end></entry>"
            )
        );
    }

    #[test]
    fn nameless_rule_cannot_be_emitted() {
        let rule = SecurityRule::from_document(RuleValue::from(json!({"action": "deny"}))).unwrap();
        assert!(matches!(rule.to_xml(), Err(RuleError::MissingName)));
    }

    #[test]
    fn collects_top_level_entries_only() {
        let reply = xml::parse(&format!(
            r#"<response status="success"><result><rules>{RULE}<entry name="deny-all"><action>deny</action></entry></rules></result></response>"#
        ))
        .unwrap();
        let rules = rules_from_xml(&reply).unwrap();
        let names: Vec<_> = rules.iter().filter_map(SecurityRule::name).collect();
        assert_eq!(names, vec!["allow-web", "deny-all"]);
    }

    #[test]
    fn candidate_config_edit_markers_keep_values() {
        let rule = SecurityRule::from_xml_str(
            r#"<entry name="r1" admin="admin" dirtyId="3" time="2024/05/01 10:00:00">
                <action admin="admin" dirtyId="3" time="2024/05/01 10:00:00">deny</action>
                <source admin="admin" dirtyId="3">
                    <member admin="admin" dirtyId="3" time="2024/05/01 10:00:00">10.0.0.1</member>
                    <member>10.0.0.2</member>
                </source>
            </entry>"#,
        )
        .unwrap();
        assert_eq!(rule.get_text(RuleKey::Action), "deny");
        assert_eq!(rule.get_list(RuleKey::SourceList), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(
            rule.to_xml_string().unwrap(),
            concat!(
                r#"<entry name="r1"><action>deny</action>"#,
                "<source><member>10.0.0.1</member><member>10.0.0.2</member></source></entry>"
            )
        );
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(
            SecurityRule::from_xml_str("<entry"),
            Err(RuleError::Xml(_))
        ));
    }
}
