use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::tree::XmlNode;
use super::XmlError;

/// Serialize an element compactly (no declaration, no indentation), the
/// form the XML API expects in `element=` parameters.
pub fn write(node: &XmlNode) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    write_node(&mut writer, node)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Serialize several sibling elements back to back.
pub fn write_all(nodes: &[XmlNode]) -> Result<String, XmlError> {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&write(node)?);
    }
    Ok(out)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &node.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn writes_compact_markup() {
        let node = XmlNode::new("entry")
            .with_attr("name", "allow-web")
            .with_child(XmlNode::with_text("action", "allow"))
            .with_child(XmlNode::new("from").with_child(XmlNode::with_text("member", "a&b")));
        assert_eq!(
            write(&node).unwrap(),
            r#"<entry name="allow-web"><action>allow</action><from><member>a&amp;b</member></from></entry>"#
        );
    }

    #[test]
    fn empty_element_is_self_closing() {
        assert_eq!(write(&XmlNode::new("tag")).unwrap(), "<tag/>");
    }

    #[test]
    fn write_all_concatenates_siblings() {
        let nodes = [XmlNode::with_text("member", "a"), XmlNode::with_text("member", "b")];
        assert_eq!(write_all(&nodes).unwrap(), "<member>a</member><member>b</member>");
    }
}
