// Config element builders
//
// `<entry>` payloads for the objects scripts create most often: services,
// IP addresses and address groups. Pair them with `xpath::object` and
// `DeviceClient::config_request(ConfigAction::Set, ..)`.

use strum::{AsRefStr, Display, EnumString};
use tracing::warn;

use crate::error::Error;
use crate::xml::XmlNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// `<tag>` and `<description>` go on every object kind, after its body.
fn attach_common(entry: &mut XmlNode, tags: &[String], description: Option<&str>) {
    if !tags.is_empty() {
        let mut root = XmlNode::new("tag");
        for tag in tags {
            root.children.push(XmlNode::with_text("member", tag));
        }
        entry.children.push(root);
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        entry.children.push(XmlNode::with_text("description", description));
    }
}

// ── Service ──────────────────────────────────────────────────────────

/// A TCP/UDP service object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub protocol: Protocol,
    /// Port, range or comma list as PAN-OS accepts it, e.g. `8080-8090`.
    pub destination_port: String,
    pub source_port: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, protocol: Protocol, destination_port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol,
            destination_port: destination_port.into(),
            source_port: None,
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_source_port(mut self, port: impl Into<String>) -> Self {
        self.source_port = Some(port.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn to_xml(&self) -> XmlNode {
        let mut ports = XmlNode::new(self.protocol.as_ref())
            .with_child(XmlNode::with_text("port", &self.destination_port));
        if let Some(source) = self.source_port.as_deref().filter(|p| !p.is_empty()) {
            ports.children.push(XmlNode::with_text("source-port", source));
        }
        let mut entry = XmlNode::new("entry")
            .with_attr("name", &self.name)
            .with_child(XmlNode::new("protocol").with_child(ports));
        attach_common(&mut entry, &self.tags, self.description.as_deref());
        entry
    }
}

// ── Address ──────────────────────────────────────────────────────────

/// An `ip-netmask` address object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub name: String,
    /// Host or CIDR, e.g. `10.0.0.0/24`.
    pub ip_netmask: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

impl AddressEntry {
    pub fn new(name: impl Into<String>, ip_netmask: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_netmask: ip_netmask.into(),
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn to_xml(&self) -> XmlNode {
        let mut entry = XmlNode::new("entry")
            .with_attr("name", &self.name)
            .with_child(XmlNode::with_text("ip-netmask", &self.ip_netmask));
        attach_common(&mut entry, &self.tags, self.description.as_deref());
        entry
    }
}

// ── Address group ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressGroupMembers {
    /// Names of address objects.
    Static(Vec<String>),
    /// Tag filter expression, e.g. `'web' and 'prod'`.
    Dynamic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressGroupEntry {
    pub name: String,
    pub members: AddressGroupMembers,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

impl AddressGroupEntry {
    pub fn new(name: impl Into<String>, members: AddressGroupMembers) -> Self {
        Self {
            name: name.into(),
            members,
            tags: Vec::new(),
            description: None,
        }
    }

    /// Static group over the named address entries.
    pub fn with_addresses<'a>(
        name: impl Into<String>,
        addresses: impl IntoIterator<Item = &'a AddressEntry>,
    ) -> Self {
        let names = addresses.into_iter().map(|a| a.name.clone()).collect();
        Self::new(name, AddressGroupMembers::Static(names))
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fails for a static group without members or a dynamic group with
    /// an empty filter.
    pub fn to_xml(&self) -> Result<XmlNode, Error> {
        let mut entry = XmlNode::new("entry").with_attr("name", &self.name);
        attach_common(&mut entry, &self.tags, self.description.as_deref());

        let body = match &self.members {
            AddressGroupMembers::Static(members) if members.is_empty() => {
                return Err(self.invalid("a static group needs at least one member"));
            }
            AddressGroupMembers::Static(members) => {
                let mut root = XmlNode::new("static");
                for member in members {
                    root.children.push(XmlNode::with_text("member", member));
                }
                root
            }
            AddressGroupMembers::Dynamic(filter) if filter.trim().is_empty() => {
                return Err(self.invalid("a dynamic group needs a filter"));
            }
            AddressGroupMembers::Dynamic(filter) => {
                XmlNode::new("dynamic").with_child(XmlNode::with_text("filter", filter))
            }
        };
        entry.children.push(body);
        Ok(entry)
    }

    fn invalid(&self, reason: &str) -> Error {
        warn!(group = %self.name, "{reason}");
        Error::InvalidElement {
            name: self.name.clone(),
            reason: reason.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::xml;

    #[test]
    fn service_with_source_port_and_tags() {
        let service = ServiceEntry::new("web-alt", Protocol::Tcp, "8080-8090")
            .with_source_port("1024-65535")
            .with_tags(["web"])
            .with_description("alt http");
        assert_eq!(
            xml::write(&service.to_xml()).unwrap(),
            concat!(
                r#"<entry name="web-alt"><protocol><tcp><port>8080-8090</port>"#,
                "<source-port>1024-65535</source-port></tcp></protocol>",
                "<tag><member>web</member></tag><description>alt http</description></entry>"
            )
        );
    }

    #[test]
    fn bare_udp_service() {
        let service = ServiceEntry::new("dns", Protocol::Udp, "53").with_description("");
        assert_eq!(
            xml::write(&service.to_xml()).unwrap(),
            r#"<entry name="dns"><protocol><udp><port>53</port></udp></protocol></entry>"#
        );
    }

    #[test]
    fn address_entry() {
        let address = AddressEntry::new("h-10.0.0.5", "10.0.0.5/32").with_tags(["lab", "db"]);
        assert_eq!(
            xml::write(&address.to_xml()).unwrap(),
            concat!(
                r#"<entry name="h-10.0.0.5"><ip-netmask>10.0.0.5/32</ip-netmask>"#,
                "<tag><member>lab</member><member>db</member></tag></entry>"
            )
        );
    }

    #[test]
    fn static_group_lists_address_names() {
        let hosts = [AddressEntry::new("a", "10.0.0.1"), AddressEntry::new("b", "10.0.0.2")];
        let group = AddressGroupEntry::with_addresses("servers", &hosts).with_description("all");
        assert_eq!(
            xml::write(&group.to_xml().unwrap()).unwrap(),
            concat!(
                r#"<entry name="servers"><description>all</description>"#,
                "<static><member>a</member><member>b</member></static></entry>"
            )
        );
    }

    #[test]
    fn dynamic_group_writes_filter() {
        let group = AddressGroupEntry::new(
            "prod-web",
            AddressGroupMembers::Dynamic("'web' and 'prod'".into()),
        );
        let node = group.to_xml().unwrap();
        assert_eq!(node.text_at("dynamic/filter"), Some("'web' and 'prod'"));
        assert!(node.child("static").is_none());
    }

    #[test]
    fn empty_groups_are_rejected() {
        let empty = AddressGroupEntry::new("none", AddressGroupMembers::Static(Vec::new()));
        assert!(matches!(
            empty.to_xml(),
            Err(Error::InvalidElement { ref name, .. }) if name == "none"
        ));
        let blank = AddressGroupEntry::new("blank", AddressGroupMembers::Dynamic(" ".into()));
        assert!(blank.to_xml().is_err());
    }
}
