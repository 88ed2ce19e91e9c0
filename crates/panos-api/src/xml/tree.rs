use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// An element of a PAN-OS XML reply or request payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlNode {
    pub tag: String,
    /// Attributes keyed by name (sorted, so serialization is stable).
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    /// Text content; whitespace-only runs are dropped by the parser.
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Leaf element holding `text`.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Text content, or `""` when the element is empty.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First element reached by a slash-separated relative path.
    ///
    /// Each step is a tag name, `*`, or a tag with a single attribute
    /// predicate such as `entry[@name='vsys1']`.
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        self.find_all(path).into_iter().next()
    }

    /// Every element reached by a slash-separated relative path, in
    /// document order.
    pub fn find_all(&self, path: &str) -> Vec<&XmlNode> {
        let mut current: Vec<&XmlNode> = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            let step = Step::parse(step);
            current = current
                .into_iter()
                .flat_map(|node| node.children.iter().filter(|c| step.matches(c)))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// Text of the element at `path`, if the element exists and has text.
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(|n| n.text.as_deref())
    }

    /// Every descendant (excluding `self`) with the given tag, depth-first
    /// in document order. Equivalent to `.//tag`.
    pub fn descendants<'a>(&'a self, tag: &str) -> Vec<&'a XmlNode> {
        let mut out = Vec::new();
        collect_descendants(self, tag, &mut out);
        out
    }

    /// Texts of every `member` child. PAN-OS encodes string lists this way.
    pub fn members(&self) -> Vec<String> {
        self.children_named("member")
            .map(|m| m.text().to_owned())
            .collect()
    }
}

fn collect_descendants<'a>(node: &'a XmlNode, tag: &str, out: &mut Vec<&'a XmlNode>) {
    for child in &node.children {
        if child.tag == tag {
            out.push(child);
        }
        collect_descendants(child, tag, out);
    }
}

// ── Path steps ──────────────────────────────────────────────────────

struct Step<'a> {
    tag: &'a str,
    predicate: Option<(&'a str, &'a str)>,
}

impl<'a> Step<'a> {
    fn parse(raw: &'a str) -> Self {
        let Some((tag, rest)) = raw.split_once('[') else {
            return Self {
                tag: raw,
                predicate: None,
            };
        };
        let predicate = rest
            .trim_end_matches(']')
            .strip_prefix('@')
            .and_then(|p| p.split_once('='))
            .map(|(key, value)| (key, value.trim_matches(|c| c == '\'' || c == '"')));
        Self { tag, predicate }
    }

    fn matches(&self, node: &XmlNode) -> bool {
        if self.tag != "*" && node.tag != self.tag {
            return false;
        }
        match self.predicate {
            Some((key, value)) => node.attr(key) == Some(value),
            None => true,
        }
    }
}

impl Display for XmlNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match super::write(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}
