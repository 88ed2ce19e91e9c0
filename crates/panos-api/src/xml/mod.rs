// XML tree, parser and writer
//
// PAN-OS answers every XML API call with a `<response status="...">`
// envelope and takes configuration payloads as serialized elements. The
// tree here is deliberately generic; callers navigate it with
// slash-separated paths (`result/system/hostname`).

mod parser;
mod tree;
mod writer;

pub use parser::parse;
pub use tree::XmlNode;
pub use writer::{write, write_all};

use thiserror::Error;

/// Errors raised while reading or producing XML.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("failed to parse XML: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid UTF-8 in XML output: {0}")]
    Output(#[from] std::string::FromUtf8Error),

    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML: {0}")]
    Malformed(String),
}
