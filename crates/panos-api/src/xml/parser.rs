use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;

use super::tree::XmlNode;
use super::XmlError;

/// Parse an XML document into an [`XmlNode`] tree rooted at its single
/// top-level element.
pub fn parse(xml: &str) -> Result<XmlNode, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_node(&e, &reader)?),
            Event::Empty(e) => {
                let node = start_node(&e, &reader)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                push_text(&mut stack, &text);
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                push_text(&mut stack, text);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("closing tag without open tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of document".into()));
    }
    root.ok_or_else(|| XmlError::Malformed("no root element".into()))
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(XmlError::Malformed("multiple top-level elements".into()));
    }
    Ok(())
}

fn push_text(stack: &mut [XmlNode], text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        match &mut current.text {
            Some(existing) => existing.push_str(text),
            None => current.text = Some(text.to_owned()),
        }
    }
}

fn start_node(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlNode, XmlError> {
    let mut node = XmlNode::new(qname(e.name())?);
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        node.attributes.insert(qname(attr.key)?, value.into_owned());
    }
    Ok(node)
}

fn qname(name: QName<'_>) -> Result<String, XmlError> {
    Ok(std::str::from_utf8(name.as_ref())?.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_response_envelope() {
        let xml = r#"<?xml version="1.0"?>
            <response status="success">
              <result>
                <system><hostname>fw1</hostname><multi-vsys>off</multi-vsys></system>
              </result>
            </response>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.tag, "response");
        assert_eq!(root.attr("status"), Some("success"));
        assert_eq!(root.text_at("result/system/hostname"), Some("fw1"));
        assert!(root.find("result").unwrap().text.is_none());
    }

    #[test]
    fn unescapes_entities_and_cdata() {
        let root = parse("<a x=\"1&amp;2\"><b>&lt;x&gt;</b><c><![CDATA[raw <y>]]></c></a>").unwrap();
        assert_eq!(root.attr("x"), Some("1&2"));
        assert_eq!(root.text_at("b"), Some("<x>"));
        assert_eq!(root.text_at("c"), Some("raw <y>"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<a/><b/>").is_err());
    }
}
