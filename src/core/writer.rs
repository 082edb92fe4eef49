//! Document to XML text rendering
//!
//! Renders an [`XmlDocument`] back to serialized packet text. Output is not
//! indented: packet bodies are measured against byte-exact section size
//! ceilings, so no cosmetic whitespace is added.

use crate::core::document::{NodeId, XmlDocument};
use crate::core::error::{DepthError, DepthResult};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Render a document to XML text
pub fn render_document(doc: &XmlDocument) -> DepthResult<String> {
    let root = doc
        .root()
        .ok_or_else(|| DepthError::SerializationError("Document has no root".to_string()))?;

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_node(doc, root, &mut writer)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map_err(|e| DepthError::SerializationError(format!("UTF-8 encoding error: {}", e)))
}

fn write_node(
    doc: &XmlDocument,
    id: NodeId,
    writer: &mut Writer<Cursor<Vec<u8>>>,
) -> DepthResult<()> {
    let node = doc.node(id);
    let qualified = node.qualified_name();

    let mut start = BytesStart::new(&qualified);
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| DepthError::SerializationError(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| DepthError::SerializationError(e.to_string()))?;

    if let Some(text) = &node.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| DepthError::SerializationError(e.to_string()))?;
    }
    for &child in &node.children {
        write_node(doc, child, writer)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(&qualified)))
        .map_err(|e| DepthError::SerializationError(e.to_string()))?;
    Ok(())
}
