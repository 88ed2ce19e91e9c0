// Panorama tags
//
// Tags live in `/config/mgt-config/devices/entry`: on the device entry for
// single-vsys firewalls, on each `vsys/entry` otherwise. These helpers read
// a snapshot of that subtree so callers can run several queries against
// one fetch.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use panos_api::XmlNode;

/// Device entries of a snapshot. Accepts the config-get reply or its
/// `<result>` element.
fn device_entries(snapshot: &XmlNode) -> impl Iterator<Item = &XmlNode> {
    snapshot
        .child("result")
        .unwrap_or(snapshot)
        .children_named("entry")
}

fn tag_members(node: &XmlNode) -> Vec<String> {
    node.find("tags").map(XmlNode::members).unwrap_or_default()
}

/// Tags keyed by `serial` for single-vsys devices and by `serial/vsys` for
/// each vsys of multi-vsys devices.
pub fn tags_by_device(snapshot: &XmlNode) -> IndexMap<String, Vec<String>> {
    let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
    for device in device_entries(snapshot) {
        let serial = device.attr("name").unwrap_or_default();
        let vsys = device.find_all("vsys/entry");
        if vsys.is_empty() {
            out.entry(serial.to_owned())
                .or_default()
                .extend(tag_members(device));
            continue;
        }
        for entry in vsys {
            let name = entry.attr("name").unwrap_or_default();
            out.entry(format!("{serial}/{name}"))
                .or_default()
                .extend(tag_members(entry));
        }
    }
    out
}

/// Devices (`serial` or `serial/vsys`, as in [`tags_by_device`]) carrying
/// `tag`.
pub fn serials_with_tag(snapshot: &XmlNode, tag: &str) -> BTreeSet<String> {
    tags_by_device(snapshot)
        .into_iter()
        .filter(|(_, tags)| tags.iter().any(|t| t == tag))
        .map(|(key, _)| key)
        .collect()
}

/// Tags of one device. Without `vsys`, every tag anywhere on the device
/// entry is returned.
pub fn tags_for_device(snapshot: &XmlNode, serial: &str, vsys: Option<&str>) -> Vec<String> {
    let Some(device) = device_entries(snapshot).find(|d| d.attr("name") == Some(serial)) else {
        return Vec::new();
    };
    match vsys {
        Some(name) => device
            .find(&format!("vsys/entry[@name='{name}']"))
            .map(tag_members)
            .unwrap_or_default(),
        None => device
            .descendants("tags")
            .into_iter()
            .flat_map(XmlNode::members)
            .collect(),
    }
}
