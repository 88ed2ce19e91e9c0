// Rule targets
//
// The `<target>` node narrows a Panorama-pushed rule to specific devices
// (optionally specific vsys) or device tags. It has a fixed shape, so it
// gets a dedicated parser instead of the generic element mapping.

use indexmap::IndexMap;
use panos_api::XmlNode;

use super::document::SecurityRule;
use super::key::RuleKey;
use super::value::{RuleValue, TargetDeviceEntry};

impl SecurityRule {
    /// Devices the rule is pushed to. Empty means every device in scope.
    pub fn target_devices(&self) -> Vec<TargetDeviceEntry> {
        self.get(RuleKey::TargetDevicesList)
            .as_list()
            .map(|items| items.iter().filter_map(TargetDeviceEntry::from_value).collect())
            .unwrap_or_default()
    }

    pub fn target_tags(&self) -> Vec<String> {
        self.get_list(RuleKey::TargetTagsList)
    }

    /// Whether the target applies to every device *except* the listed ones.
    pub fn target_negated(&self) -> bool {
        self.get_text(RuleKey::TargetNegate) == "yes"
    }
}

pub(crate) fn parse_target(node: &XmlNode) -> RuleValue {
    let mut target = IndexMap::new();

    if let Some(negate) = node.child("negate") {
        target.insert("negate".to_owned(), RuleValue::from(negate.text()));
    }

    if let Some(devices) = node.child("devices") {
        let entries: Vec<RuleValue> = devices
            .children_named("entry")
            .filter_map(|entry| {
                let serial = entry.attr("name")?;
                let vsys = entry
                    .find_all("vsys/entry")
                    .into_iter()
                    .filter_map(|v| v.attr("name").map(str::to_owned))
                    .collect();
                Some(
                    TargetDeviceEntry {
                        serial: serial.to_owned(),
                        vsys,
                    }
                    .into(),
                )
            })
            .collect();
        target.insert(
            "devices".to_owned(),
            RuleValue::Map(IndexMap::from([("entry".to_owned(), RuleValue::List(entries))])),
        );
    }

    if let Some(tags) = node.child("tags") {
        target.insert(
            "tags".to_owned(),
            RuleValue::Map(IndexMap::from([(
                "member".to_owned(),
                RuleValue::from(tags.members()),
            )])),
        );
    }

    RuleValue::Map(target)
}

/// Build the `<target>` element. Facets still at their default are left
/// out, and `None` is returned when nothing remains.
pub(crate) fn emit_target(value: &RuleValue) -> Option<XmlNode> {
    let map = value.as_map()?;
    let mut node = XmlNode::new("target");

    if let Some(negate) = map
        .get("negate")
        .and_then(RuleValue::as_text)
        .filter(|n| !n.is_empty() && *n != "no")
    {
        node.children.push(XmlNode::with_text("negate", negate));
    }

    let devices: Vec<TargetDeviceEntry> = facet(map, "devices", "entry")
        .iter()
        .filter_map(TargetDeviceEntry::from_value)
        .collect();
    if !devices.is_empty() {
        let mut parent = XmlNode::new("devices");
        for device in devices {
            let mut entry = XmlNode::new("entry").with_attr("name", device.serial);
            if !device.vsys.is_empty() {
                let mut vsys = XmlNode::new("vsys");
                for name in device.vsys {
                    vsys.children.push(XmlNode::new("entry").with_attr("name", name));
                }
                entry.children.push(vsys);
            }
            parent.children.push(entry);
        }
        node.children.push(parent);
    }

    let tags: Vec<&str> = facet(map, "tags", "member")
        .iter()
        .filter_map(RuleValue::as_text)
        .collect();
    if !is_any(&tags) {
        let mut parent = XmlNode::new("tags");
        for tag in tags {
            parent.children.push(XmlNode::with_text("member", tag));
        }
        node.children.push(parent);
    }

    (!node.children.is_empty()).then_some(node)
}

fn facet<'a>(map: &'a IndexMap<String, RuleValue>, root: &str, list: &str) -> &'a [RuleValue] {
    map.get(root)
        .and_then(RuleValue::as_map)
        .and_then(|m| m.get(list))
        .and_then(RuleValue::as_list)
        .unwrap_or_default()
}

fn is_any(items: &[&str]) -> bool {
    matches!(items, [] | ["any"])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use panos_api::xml;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_devices_vsys_and_tags() {
        let node = xml::parse(
            r#"<target><negate>yes</negate><devices><entry name="0001"><vsys><entry name="vsys1"/><entry name="vsys2"/></vsys></entry><entry name="0002"/></devices><tags><member>branch</member></tags></target>"#,
        )
        .unwrap();
        let value = parse_target(&node);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["negate"], "yes");
        assert_eq!(
            json["devices"]["entry"],
            serde_json::json!([
                {"@name": "0001", "vsys": {"entry": [{"@name": "vsys1"}, {"@name": "vsys2"}]}},
                {"@name": "0002"}
            ])
        );
        assert_eq!(json["tags"]["member"], serde_json::json!(["branch"]));

        let emitted = emit_target(&value).unwrap();
        assert_eq!(parse_target(&emitted), value);
    }

    #[test]
    fn default_facets_are_omitted() {
        let value = parse_target(
            &xml::parse("<target><negate>no</negate><devices/><tags><member>any</member></tags></target>")
                .unwrap(),
        );
        assert!(emit_target(&value).is_none());
    }

    #[test]
    fn only_non_default_facets_are_written() {
        let value = parse_target(
            &xml::parse(r#"<target><negate>no</negate><devices><entry name="0001"/></devices></target>"#)
                .unwrap(),
        );
        let out = xml::write(&emit_target(&value).unwrap()).unwrap();
        assert_eq!(out, r#"<target><devices><entry name="0001"/></devices></target>"#);
    }
}
