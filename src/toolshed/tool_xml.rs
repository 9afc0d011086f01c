// src/toolshed/tool_xml.rs

//! Galaxy tool XML scanning
//!
//! Only two things matter for reconciliation: the `id`/`version` attributes of
//! a `<tool>` root element, and `<token>` definitions (inline or in a
//! `<macros>` file) that tool versions are often built from, e.g.
//! `version="@TOOL_VERSION@+galaxy@VERSION_SUFFIX@"`.

use crate::error::{Error, Result};
use crate::package::ToolVersion;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;

/// Version Galaxy assumes when a tool does not declare one
pub const DEFAULT_TOOL_VERSION: &str = "1.0.0";

/// Maximum nesting of tokens inside token values
const MAX_EXPANSION_PASSES: usize = 8;

/// What an XML file in a repository turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlRoot {
    /// A tool definition, version still unexpanded
    Tool { id: String, version: Option<String> },
    Macros,
    Other,
}

/// Scan result of one XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedXml {
    pub root: XmlRoot,
    /// `<token name="...">value</token>` definitions, in document order
    pub tokens: Vec<(String, String)>,
}

/// Scan an XML document for a tool definition and token definitions
pub fn scan(content: &str) -> Result<ScannedXml> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut root = None;
    let mut tokens = Vec::new();
    let mut open_token: Option<(String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_none() {
                    root = Some(classify_root(&e)?);
                }
                if e.name().as_ref() == b"token" {
                    if let Some(name) = attribute(&e, b"name")? {
                        open_token = Some((name, String::new()));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    root = Some(classify_root(&e)?);
                }
                if e.name().as_ref() == b"token" {
                    if let Some(name) = attribute(&e, b"name")? {
                        tokens.push((name, String::new()));
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, value)) = open_token.as_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::ParseError(format!("Invalid token text: {e}")))?;
                    value.push_str(&text);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, value)) = open_token.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"token" {
                    if let Some(token) = open_token.take() {
                        tokens.push(token);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::ParseError(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(ScannedXml {
        root: root.unwrap_or(XmlRoot::Other),
        tokens,
    })
}

fn classify_root(e: &BytesStart) -> Result<XmlRoot> {
    Ok(match e.name().as_ref() {
        b"tool" => match attribute(e, b"id")? {
            Some(id) => XmlRoot::Tool {
                id,
                version: attribute(e, b"version")?,
            },
            None => XmlRoot::Other,
        },
        b"macros" => XmlRoot::Macros,
        _ => XmlRoot::Other,
    })
}

fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::ParseError(format!("Invalid XML attribute: {e}")))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::ParseError(format!("Invalid XML attribute value: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Replace every known token in `value`, including tokens inside tokens
pub fn expand_tokens(value: &str, tokens: &HashMap<String, String>) -> String {
    let mut expanded = value.to_string();
    for _ in 0..MAX_EXPANSION_PASSES {
        if !expanded.contains('@') {
            break;
        }
        let before = expanded.clone();
        for (name, replacement) in tokens {
            if expanded.contains(name.as_str()) {
                expanded = expanded.replace(name.as_str(), replacement);
            }
        }
        if expanded == before {
            break;
        }
    }
    expanded
}

/// Resolve a scanned tool against the token table
pub fn tool_version(root: &XmlRoot, tokens: &HashMap<String, String>) -> Option<ToolVersion> {
    match root {
        XmlRoot::Tool { id, version } => {
            let version = version.as_deref().unwrap_or(DEFAULT_TOOL_VERSION);
            Some(ToolVersion::new(
                expand_tokens(id, tokens),
                expand_tokens(version, tokens),
            ))
        }
        _ => None,
    }
}
