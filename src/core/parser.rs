//! XML text to document parsing
//!
//! Parses serialized XMP packet text into an [`XmlDocument`] tree. Only the
//! element/attribute/text subset Dynamic Depth uses is modeled; processing
//! instructions and comments are skipped.

use crate::core::document::{NodeId, XmlDocument, XmlNode};
use crate::core::error::{DepthError, DepthResult};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

/// Parse XML text into a document tree.
///
/// Fails on malformed XML or when the text contains no root element.
pub fn parse_document(xml: &str) -> DepthResult<XmlDocument> {
    let mut reader = Reader::from_str(xml);

    let mut doc = XmlDocument::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let id = open_element(&mut doc, &stack, &e)?;
                stack.push(id);
            }
            Ok(Event::Empty(e)) => {
                open_element(&mut doc, &stack, &e)?;
            }
            Ok(Event::End(_)) => {
                if let Some(id) = stack.pop() {
                    finalize_text(doc.node_mut(id));
                }
            }
            // Entity references split text into separate events, so content
            // is appended per fragment and trimmed when the element closes
            Ok(Event::Text(e)) => {
                let raw = String::from_utf8_lossy(e.as_ref());
                let text = match unescape(&raw) {
                    Ok(unescaped) => unescaped.to_string(),
                    Err(_) => raw.to_string(),
                };
                if let Some(&current) = stack.last() {
                    append_text(doc.node_mut(current), &text);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                let resolved = resolve_reference(&e)?;
                if let Some(&current) = stack.last() {
                    append_text(doc.node_mut(current), &resolved);
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, PIs and comments carry nothing we model
            Ok(_) => {}
            Err(e) => {
                return Err(DepthError::ParseError(format!("Malformed XML: {}", e)));
            }
        }
        buf.clear();
    }

    if doc.root().is_none() {
        return Err(DepthError::ParseError("No root element found".to_string()));
    }
    Ok(doc)
}

fn open_element(
    doc: &mut XmlDocument,
    stack: &[NodeId],
    e: &BytesStart<'_>,
) -> DepthResult<NodeId> {
    let raw_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let (prefix, local) = split_qualified(&raw_name);
    let id = doc.create_node(prefix, local);

    for attr in e.attributes() {
        let attr: Attribute = attr
            .map_err(|e| DepthError::ParseError(format!("Malformed attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| DepthError::ParseError(format!("Malformed attribute value: {}", e)))?;
        doc.node_mut(id).set_attribute(&key, &value);
    }

    match stack.last() {
        Some(&parent) => doc.append_child(parent, id),
        None => {
            if doc.root().is_some() {
                return Err(DepthError::ParseError(
                    "Multiple root elements".to_string(),
                ));
            }
            doc.set_root(id);
        }
    }
    Ok(id)
}

fn append_text(node: &mut XmlNode, text: &str) {
    match &mut node.text {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
}

/// Trim the assembled text content of a closed element; whitespace-only
/// content (indentation between child elements) collapses to no text
fn finalize_text(node: &mut XmlNode) {
    if let Some(text) = node.text.take() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            node.text = Some(trimmed.to_string());
        }
    }
}

/// Resolve a character reference (`&#...;`) or predefined entity reference
fn resolve_reference(e: &BytesRef<'_>) -> DepthResult<String> {
    let resolved = e
        .resolve_char_ref()
        .map_err(|e| DepthError::ParseError(format!("Invalid character reference: {}", e)))?;
    if let Some(ch) = resolved {
        return Ok(ch.to_string());
    }
    let name = String::from_utf8_lossy(e);
    match resolve_predefined_entity(&name) {
        Some(text) => Ok(text.to_string()),
        None => Err(DepthError::ParseError(format!(
            "Unknown entity reference: &{};",
            name
        ))),
    }
}

/// Split a qualified XML name into (prefix, local name)
fn split_qualified(raw: &str) -> (&str, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", raw),
    }
}
