use indexmap::IndexMap;
use panos_api::XmlNode;
use serde::Serialize;

/// A device group in the Panorama hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceGroupNode {
    pub name: String,
    pub id: Option<String>,
    pub children: Vec<DeviceGroupNode>,
}

impl DeviceGroupNode {
    fn from_xml(node: &XmlNode) -> Self {
        Self {
            name: node.attr("name").unwrap_or_default().to_owned(),
            id: node.attr("dg_id").map(str::to_owned),
            children: node.children_named("dg").map(Self::from_xml).collect(),
        }
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        for child in &self.children {
            out.push(child.name.clone());
            child.collect_names(out);
        }
    }

    fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Group name → one map per occurrence of that group, describing its
/// children. A leaf group maps to `[{}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HierarchyMap(pub IndexMap<String, Vec<HierarchyMap>>);

/// The device-group tree from `show dg-hierarchy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceGroupHierarchy {
    roots: Vec<DeviceGroupNode>,
}

impl DeviceGroupHierarchy {
    /// Accepts the whole reply or the `<dg-hierarchy>` element itself.
    pub fn from_xml(reply: &XmlNode) -> Self {
        let root = if reply.tag == "dg-hierarchy" {
            Some(reply)
        } else {
            reply.descendants("dg-hierarchy").into_iter().next()
        };
        let roots = root
            .map(|r| r.children_named("dg").map(DeviceGroupNode::from_xml).collect())
            .unwrap_or_default();
        Self { roots }
    }

    pub fn roots(&self) -> &[DeviceGroupNode] {
        &self.roots
    }

    /// Every group name, depth-first.
    pub fn names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for root in &self.roots {
            out.push(root.name.clone());
            root.collect_names(&mut out);
        }
        out
    }

    pub fn find(&self, name: &str) -> Option<&DeviceGroupNode> {
        self.roots.iter().find_map(|r| r.find(name))
    }

    /// Names of every group below `name`, not including `name`. Empty when
    /// the group is unknown.
    pub fn descendants(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(node) = self.find(name) {
            node.collect_names(&mut out);
        }
        out
    }

    pub fn to_map(&self) -> HierarchyMap {
        level_map(&self.roots)
    }
}

fn level_map(nodes: &[DeviceGroupNode]) -> HierarchyMap {
    let mut map: IndexMap<String, Vec<HierarchyMap>> = IndexMap::new();
    for node in nodes {
        if node.children.is_empty() {
            map.insert(node.name.clone(), vec![HierarchyMap::default()]);
        } else {
            map.entry(node.name.clone())
                .or_default()
                .push(level_map(&node.children));
        }
    }
    HierarchyMap(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const REPLY: &str = r#"<response status="success"><result><dg-hierarchy>
        <dg name="global" dg_id="11">
            <dg name="emea" dg_id="12"><dg name="paris" dg_id="14"/></dg>
            <dg name="apac" dg_id="13"/>
        </dg>
        <dg name="lab" dg_id="20"/>
    </dg-hierarchy></result></response>"#;

    fn hierarchy() -> DeviceGroupHierarchy {
        DeviceGroupHierarchy::from_xml(&panos_api::xml::parse(REPLY).unwrap())
    }

    #[test]
    fn lists_names_depth_first() {
        assert_eq!(hierarchy().names(), vec!["global", "emea", "paris", "apac", "lab"]);
    }

    #[test]
    fn descendants_exclude_the_group_itself() {
        let h = hierarchy();
        assert_eq!(h.descendants("global"), vec!["emea", "paris", "apac"]);
        assert_eq!(h.descendants("emea"), vec!["paris"]);
        assert!(h.descendants("lab").is_empty());
        assert!(h.descendants("missing").is_empty());
        assert_eq!(h.find("paris").unwrap().id.as_deref(), Some("14"));
    }

    #[test]
    fn map_form_nests_child_lists() {
        let map = serde_json::to_value(hierarchy().to_map()).unwrap();
        assert_eq!(
            map,
            json!({
                "global": [{"emea": [{"paris": [{}]}], "apac": [{}]}],
                "lab": [{}]
            })
        );
    }

    #[test]
    fn missing_hierarchy_is_empty() {
        let reply = panos_api::xml::parse(r#"<response status="success"><result/></response>"#).unwrap();
        assert!(DeviceGroupHierarchy::from_xml(&reply).names().is_empty());
    }
}
