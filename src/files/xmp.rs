//! Standard / extended XMP packet protocol
//!
//! Dynamic Depth rides in APP1 sections using the Adobe XMP convention.
//! The primary metadata lives in one size-bounded standard packet; payloads
//! that do not fit are pushed to extended XMP: additional APP1 sections
//! sharing an MD5 content hash (GUID) and reassembled through per-fragment
//! total-length/offset headers. The standard packet links to the extended
//! one via the `xmpNote:HasExtendedXMP` property.
//!
//! Wire layout of one extended fragment payload:
//! extension header + NUL, 32-byte hex GUID, 4-byte BE total length,
//! 4-byte BE offset, fragment body.

use crate::core::deserializer::Deserializer;
use crate::core::document::XmlDocument;
use crate::core::error::{DepthError, DepthResult};
use crate::core::namespace::{ns, NamespaceTable};
use crate::core::parser::parse_document;
use crate::core::writer::render_document;
use crate::files::jpeg::{parse_sections, ParseOptions, Section, MARKER_APP1};
use log::{error, warn};
use std::io::{Read, Seek};

/// Standard XMP section header, including the NUL terminator
pub const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
/// Extended XMP section header, including the NUL separator
pub const XMP_EXTENSION_HEADER: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";
/// EXIF section signature
const EXIF_HEADER: &[u8] = b"Exif\0";

/// Content-hash length: 32 lowercase hex characters of an MD5 digest
const GUID_LEN: usize = 32;
/// Bytes of GUID plus total-length and offset fields in each fragment
const EXTENSION_PREFIX_LEN: usize = GUID_LEN + 8;

/// Ceiling for the rendered standard packet body
pub const MAX_STANDARD_BODY: usize = 65502;
/// Ceiling for one extended fragment body
pub const MAX_EXTENDED_BODY: usize = 65458;

/// Qualified name of the extended-XMP link property
const HAS_EXTENDED_XMP: &str = "xmpNote:HasExtendedXMP";

/// One logical XMP packet: the standard tree, plus the extended tree when
/// the payload did not fit in one section.
///
/// The packet exclusively owns the backing documents; serializer and
/// deserializer views borrow them and never outlive the packet.
#[derive(Debug, Clone)]
pub struct XmpPacket {
    /// The primary, size-bounded tree
    pub standard: XmlDocument,
    /// The overflow tree, absent for small payloads
    pub extended: Option<XmlDocument>,
}

impl XmpPacket {
    /// Build a fresh packet with the `x:xmpmeta / rdf:RDF / rdf:Description`
    /// skeleton in each document, declaring every namespace of `table` on
    /// the description node.
    ///
    /// When `with_extended` is set the standard document additionally
    /// declares `xmpNote`, since it will carry the extended-XMP link.
    pub fn new(table: &NamespaceTable, with_extended: bool) -> Self {
        let standard = create_xmp_document(table, with_extended);
        let extended = with_extended.then(|| create_xmp_document(table, false));
        XmpPacket { standard, extended }
    }
}

fn create_xmp_document(table: &NamespaceTable, declare_note: bool) -> XmlDocument {
    let mut doc = XmlDocument::new();
    let meta = doc.create_node(ns::X_PREFIX, "xmpmeta");
    let rdf = doc.create_node(ns::RDF_PREFIX, "RDF");
    let desc = doc.create_node(ns::RDF_PREFIX, "Description");

    doc.node_mut(meta).set_attribute("xmlns:x", ns::X);
    doc.node_mut(rdf).set_attribute("xmlns:rdf", ns::RDF);
    doc.node_mut(desc).set_attribute("rdf:about", "");
    for (prefix, uri) in table.iter() {
        doc.node_mut(desc)
            .set_attribute(&format!("xmlns:{}", prefix), uri);
    }
    if declare_note {
        doc.node_mut(desc)
            .set_attribute(&format!("xmlns:{}", ns::XMP_NOTE_PREFIX), ns::XMP_NOTE);
    }

    doc.set_root(meta);
    doc.append_child(meta, rdf);
    doc.append_child(rdf, desc);
    doc
}

/// Read the extended-XMP content hash declared by a standard tree, if any
pub fn has_extended_guid(standard: &XmlDocument) -> Option<String> {
    let deserializer = Deserializer::from_document(standard)?;
    deserializer.parse_string(ns::XMP_NOTE_PREFIX, "HasExtendedXMP")
}

/// Extract the XMP packet from a JPEG stream.
///
/// Scans sections in metadata-only mode; the standard section is required,
/// the extended one is reassembled only when the standard tree declares it.
pub fn extract_xmp<R: Read + Seek>(reader: &mut R) -> DepthResult<XmpPacket> {
    let options = ParseOptions::default().read_meta_only();
    let sections = parse_sections(reader, &options);
    extract_xmp_from_sections(&sections)
}

/// Extract the XMP packet from an already-parsed section list
pub fn extract_xmp_from_sections(sections: &[Section]) -> DepthResult<XmpPacket> {
    let standard_section = sections
        .iter()
        .find(|s| s.starts_with(XMP_HEADER))
        .ok_or_else(|| DepthError::NotFound("No standard XMP section found".to_string()))?;

    let body = &standard_section.payload[XMP_HEADER.len()..];
    let text = std::str::from_utf8(body)
        .map_err(|e| DepthError::ParseError(format!("Standard XMP is not UTF-8: {}", e)))?;
    let content_end = xmp_content_end(text);
    let standard = parse_document(&text[..content_end])?;

    let extended = match has_extended_guid(&standard) {
        None => None,
        Some(guid) => Some(reassemble_extended(sections, &guid)?),
    };
    Ok(XmpPacket { standard, extended })
}

/// Reassemble and parse the extended tree from fragments carrying `guid`.
///
/// Placement is offset-driven: fragments may arrive in any order, and the
/// buffer is sized by the first fragment's declared total length. Any
/// offset/length inconsistency fails the whole extraction.
fn reassemble_extended(sections: &[Section], guid: &str) -> DepthResult<XmlDocument> {
    let header_len = XMP_EXTENSION_HEADER.len();
    let mut buffer: Option<Vec<u8>> = None;

    for section in sections.iter().filter(|s| s.starts_with(XMP_EXTENSION_HEADER)) {
        let payload = &section.payload;
        // Unrelated extended XMP, whatever its shape, is not a candidate
        if payload.len() < header_len + GUID_LEN
            || payload[header_len..header_len + GUID_LEN] != *guid.as_bytes()
        {
            continue;
        }
        if payload.len() < header_len + EXTENSION_PREFIX_LEN {
            return Err(DepthError::ParseError(
                "Extended XMP fragment is too short".to_string(),
            ));
        }

        let fields = &payload[header_len + GUID_LEN..];
        let total = u32::from_be_bytes([fields[0], fields[1], fields[2], fields[3]]);
        let offset = u32::from_be_bytes([fields[4], fields[5], fields[6], fields[7]]);
        let body = &payload[header_len + EXTENSION_PREFIX_LEN..];

        let buf = buffer.get_or_insert_with(|| vec![0u8; total as usize]);
        let end = (offset as usize).checked_add(body.len()).ok_or_else(|| {
            DepthError::ParseError("Extended XMP offset overflow".to_string())
        })?;
        if end > buf.len() {
            warn!(
                "Extended XMP fragment at offset {} overruns declared total {}",
                offset,
                buf.len()
            );
            return Err(DepthError::ParseError(
                "Extended XMP fragment exceeds its declared total length".to_string(),
            ));
        }
        buf[offset as usize..end].copy_from_slice(body);
    }

    let buffer = buffer.ok_or_else(|| {
        DepthError::NotFound(format!("No extended XMP fragments carry hash {}", guid))
    })?;
    let text = std::str::from_utf8(&buffer)
        .map_err(|e| DepthError::ParseError(format!("Extended XMP is not UTF-8: {}", e)))?;
    parse_document(text)
}

/// Serialize a packet into its JPEG sections: one standard section, then
/// zero or more extended fragments in offset order.
///
/// When an extended tree exists, its content hash is written into the
/// standard tree (`xmpNote:HasExtendedXMP`) before the standard text is
/// rendered. A standard body over [`MAX_STANDARD_BODY`] is a hard failure:
/// Dynamic Depth keeps primary metadata small and pushes bulk payloads to
/// the extended section or to trailing container files.
pub fn serialize_packet(packet: &mut XmpPacket) -> DepthResult<Vec<Section>> {
    let extended_text = match &packet.extended {
        Some(doc) => Some(render_document(doc)?),
        None => None,
    };

    let guid = extended_text
        .as_ref()
        .map(|text| format!("{:032x}", md5::compute(text.as_bytes())));
    if let Some(guid) = &guid {
        // The skeleton may have been built without extended support
        set_description_attribute(
            &mut packet.standard,
            &format!("xmlns:{}", ns::XMP_NOTE_PREFIX),
            ns::XMP_NOTE,
        )?;
        set_description_attribute(&mut packet.standard, HAS_EXTENDED_XMP, guid)?;
    }

    let standard_text = render_document(&packet.standard)?;
    if standard_text.len() > MAX_STANDARD_BODY {
        return Err(DepthError::SizeLimitExceeded(format!(
            "Standard XMP body of {} bytes exceeds the {} byte ceiling",
            standard_text.len(),
            MAX_STANDARD_BODY
        )));
    }

    let mut payload = Vec::with_capacity(XMP_HEADER.len() + standard_text.len());
    payload.extend_from_slice(XMP_HEADER);
    payload.extend_from_slice(standard_text.as_bytes());
    let mut sections = vec![Section {
        marker: MARKER_APP1,
        is_image_data: false,
        payload,
    }];

    if let (Some(text), Some(guid)) = (extended_text, guid) {
        let bytes = text.as_bytes();
        let total = bytes.len() as u32;
        // Segment count carried over from existing writers for byte-for-byte
        // wire compatibility: an evenly divisible payload yields one
        // trailing empty-body fragment.
        let segment_count = bytes.len() / MAX_EXTENDED_BODY + 1;
        for i in 0..segment_count {
            let start = i * MAX_EXTENDED_BODY;
            let end = usize::min(bytes.len(), start + MAX_EXTENDED_BODY);
            let body = &bytes[start..end];

            let mut payload =
                Vec::with_capacity(XMP_EXTENSION_HEADER.len() + EXTENSION_PREFIX_LEN + body.len());
            payload.extend_from_slice(XMP_EXTENSION_HEADER);
            payload.extend_from_slice(guid.as_bytes());
            payload.extend_from_slice(&total.to_be_bytes());
            payload.extend_from_slice(&(start as u32).to_be_bytes());
            payload.extend_from_slice(body);
            sections.push(Section {
                marker: MARKER_APP1,
                is_image_data: false,
                payload,
            });
        }
    }
    Ok(sections)
}

/// Serialize a packet and splice its sections into an existing list.
///
/// The new standard section replaces a pre-existing standard-XMP section at
/// its original position; with none present it goes after a leading EXIF
/// section, else first. Extended fragments follow the standard section in
/// offset order, and stale extended fragments are dropped.
pub fn add_xmp_to_sections(
    packet: &mut XmpPacket,
    sections: &mut Vec<Section>,
) -> DepthResult<()> {
    let new_sections = serialize_packet(packet)?;

    sections.retain(|s| !s.starts_with(XMP_EXTENSION_HEADER));
    let insert_at = match sections.iter().position(|s| s.starts_with(XMP_HEADER)) {
        Some(index) => {
            sections.remove(index);
            index
        }
        None => {
            let leading_exif = sections
                .first()
                .map_or(false, |s| s.marker == MARKER_APP1 && s.starts_with(EXIF_HEADER));
            usize::from(leading_exif)
        }
    };
    for (offset, section) in new_sections.into_iter().enumerate() {
        sections.insert(insert_at + offset, section);
    }
    Ok(())
}

/// Position one past the last `>` that does not terminate a processing
/// instruction, which strips the trailing `<?xpacket end=...?>` wrapper
fn xmp_content_end(text: &str) -> usize {
    let bytes = text.as_bytes();
    for i in (1..bytes.len()).rev() {
        if bytes[i] == b'>' && bytes[i - 1] != b'?' {
            return i + 1;
        }
    }
    text.len()
}

fn set_description_attribute(
    doc: &mut XmlDocument,
    qualified_name: &str,
    value: &str,
) -> DepthResult<()> {
    let desc = doc.find_node(ns::RDF_PREFIX, "Description").ok_or_else(|| {
        error!("Standard XMP document has no rdf:Description node");
        DepthError::BadParam("Standard XMP document has no rdf:Description node".to_string())
    })?;
    doc.node_mut(desc).set_attribute(qualified_name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::serializer::Serializer;
    use pretty_assertions::assert_eq;

    fn device_table() -> NamespaceTable {
        let mut table = NamespaceTable::new();
        table.register("Device", ns::DEVICE).unwrap();
        table
    }

    #[test]
    fn test_standard_only_round_trip() {
        let table = device_table();
        let mut packet = XmpPacket::new(&table, false);
        {
            let mut serializer =
                Serializer::from_document(&mut packet.standard, &table).unwrap();
            serializer
                .write_property("Device", "Revision", "1.0")
                .unwrap();
        }

        let sections = serialize_packet(&mut packet).unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].starts_with(XMP_HEADER));

        let parsed = extract_xmp_from_sections(&sections).unwrap();
        assert!(parsed.extended.is_none());
        let deserializer = Deserializer::from_document(&parsed.standard).unwrap();
        assert_eq!(
            deserializer.parse_string("Device", "Revision"),
            Some("1.0".to_string())
        );
    }

    #[test]
    fn test_no_xmp_section() {
        let sections = vec![Section {
            marker: 0xE0,
            is_image_data: false,
            payload: b"JFIF\0".to_vec(),
        }];
        assert!(matches!(
            extract_xmp_from_sections(&sections),
            Err(DepthError::NotFound(_))
        ));
    }

    #[test]
    fn test_xmp_content_end_strips_wrapper() {
        let text = "<x:xmpmeta></x:xmpmeta><?xpacket end=\"w\"?>";
        assert_eq!(&text[..xmp_content_end(text)], "<x:xmpmeta></x:xmpmeta>");

        let bare = "<x:xmpmeta></x:xmpmeta>";
        assert_eq!(xmp_content_end(bare), bare.len());
    }

    #[test]
    fn test_extended_round_trip_two_fragments() {
        let table = device_table();
        let mut packet = XmpPacket::new(&table, true);
        {
            let extended = packet.extended.as_mut().unwrap();
            let mut serializer = Serializer::from_document(extended, &table).unwrap();
            // Large enough to need a second fragment
            let big = "x".repeat(MAX_EXTENDED_BODY + 100);
            serializer.write_property("Device", "Blob", &big).unwrap();
        }

        let sections = serialize_packet(&mut packet).unwrap();
        // 1 standard + 2 extended fragments
        assert_eq!(sections.len(), 3);
        assert!(sections[1].starts_with(XMP_EXTENSION_HEADER));
        assert!(sections[2].starts_with(XMP_EXTENSION_HEADER));

        // The second fragment's offset equals the first fragment's body length
        let fields_at = XMP_EXTENSION_HEADER.len() + GUID_LEN;
        let first_body_len = sections[1].payload.len() - fields_at - 8;
        let second_offset = u32::from_be_bytes(
            sections[2].payload[fields_at + 4..fields_at + 8]
                .try_into()
                .unwrap(),
        );
        assert_eq!(second_offset as usize, first_body_len);
        assert_eq!(first_body_len, MAX_EXTENDED_BODY);

        let parsed = extract_xmp_from_sections(&sections).unwrap();
        let extended = parsed.extended.expect("extended tree expected");
        let deserializer = Deserializer::from_document(&extended).unwrap();
        assert_eq!(
            deserializer.parse_string("Device", "Blob").map(|s| s.len()),
            Some(MAX_EXTENDED_BODY + 100)
        );
    }

    #[test]
    fn test_fragment_order_is_irrelevant() {
        let table = device_table();
        let mut packet = XmpPacket::new(&table, true);
        {
            let extended = packet.extended.as_mut().unwrap();
            let mut serializer = Serializer::from_document(extended, &table).unwrap();
            let big = "y".repeat(MAX_EXTENDED_BODY + 50);
            serializer.write_property("Device", "Blob", &big).unwrap();
        }
        let mut sections = serialize_packet(&mut packet).unwrap();
        // Swap the two fragments; offsets, not arrival order, drive placement
        sections.swap(1, 2);
        let parsed = extract_xmp_from_sections(&sections).unwrap();
        assert!(parsed.extended.is_some());
    }

    #[test]
    fn test_standard_body_ceiling() {
        let table = device_table();

        // Probe the fixed skeleton overhead, then fill to exactly the ceiling
        let mut probe = XmpPacket::new(&table, false);
        let overhead = render_document(&probe.standard).unwrap().len()
            + r#" Device:Pad="""#.len();
        {
            let mut serializer = Serializer::from_document(&mut probe.standard, &table).unwrap();
            serializer
                .write_property("Device", "Pad", &"p".repeat(MAX_STANDARD_BODY - overhead))
                .unwrap();
        }
        assert!(serialize_packet(&mut probe).is_ok());

        // One byte over fails
        let mut over = XmpPacket::new(&table, false);
        {
            let mut serializer = Serializer::from_document(&mut over.standard, &table).unwrap();
            serializer
                .write_property("Device", "Pad", &"p".repeat(MAX_STANDARD_BODY - overhead + 1))
                .unwrap();
        }
        assert!(matches!(
            serialize_packet(&mut over),
            Err(DepthError::SizeLimitExceeded(_))
        ));
    }

    #[test]
    fn test_wrong_guid_fragments_ignored() {
        let table = device_table();
        let mut packet = XmpPacket::new(&table, true);
        {
            let extended = packet.extended.as_mut().unwrap();
            let mut serializer = Serializer::from_document(extended, &table).unwrap();
            serializer.write_property("Device", "Blob", "small").unwrap();
        }
        let mut sections = serialize_packet(&mut packet).unwrap();
        // Corrupt the fragment's GUID: reassembly finds no candidates
        let at = XMP_EXTENSION_HEADER.len();
        for byte in &mut sections[1].payload[at..at + GUID_LEN] {
            *byte = b'0';
        }
        assert!(extract_xmp_from_sections(&sections).is_err());
    }

    #[test]
    fn test_late_extended_tree_gets_note_declaration() {
        let table = device_table();
        // Skeleton built without extended support, extended tree added later
        let mut packet = XmpPacket::new(&table, false);
        packet.extended = XmpPacket::new(&table, true).extended;

        let sections = serialize_packet(&mut packet).unwrap();
        let body = &sections[0].payload[XMP_HEADER.len()..];
        let standard = parse_document(std::str::from_utf8(body).unwrap()).unwrap();
        let desc = standard.find_node(ns::RDF_PREFIX, "Description").unwrap();
        assert_eq!(
            standard.node(desc).attribute("xmlns:xmpNote"),
            Some(ns::XMP_NOTE)
        );
        assert!(standard.node(desc).attribute(HAS_EXTENDED_XMP).is_some());
    }

    #[test]
    fn test_short_unrelated_fragment_skipped() {
        let table = device_table();
        let mut packet = XmpPacket::new(&table, true);
        {
            let extended = packet.extended.as_mut().unwrap();
            let mut serializer = Serializer::from_document(extended, &table).unwrap();
            serializer.write_property("Device", "Blob", "data").unwrap();
        }
        let mut sections = serialize_packet(&mut packet).unwrap();

        // A runt extension section too short to even carry a hash
        let mut runt = XMP_EXTENSION_HEADER.to_vec();
        runt.extend_from_slice(b"short");
        sections.push(Section {
            marker: MARKER_APP1,
            is_image_data: false,
            payload: runt,
        });

        let parsed = extract_xmp_from_sections(&sections).unwrap();
        assert!(parsed.extended.is_some());
    }

    #[test]
    fn test_insertion_replaces_existing_xmp() {
        let table = device_table();

        let exif = Section {
            marker: MARKER_APP1,
            is_image_data: false,
            payload: b"Exif\0\0fake".to_vec(),
        };
        let mut old_packet = XmpPacket::new(&table, false);
        let old_xmp = serialize_packet(&mut old_packet).unwrap().remove(0);
        let scan = Section {
            marker: 0xDA,
            is_image_data: true,
            payload: vec![1, 2, 3],
        };
        let mut sections = vec![exif.clone(), old_xmp, scan.clone()];

        let mut packet = XmpPacket::new(&table, false);
        {
            let mut serializer =
                Serializer::from_document(&mut packet.standard, &table).unwrap();
            serializer.write_property("Device", "Revision", "2.0").unwrap();
        }
        add_xmp_to_sections(&mut packet, &mut sections).unwrap();

        assert_eq!(sections.len(), 3);
        assert!(sections[0].starts_with(b"Exif\0"));
        assert!(sections[1].starts_with(XMP_HEADER));
        assert!(sections[2].is_image_data);

        // With no pre-existing XMP, insertion lands after the leading EXIF
        let mut fresh = vec![exif.clone(), scan.clone()];
        add_xmp_to_sections(&mut packet, &mut fresh).unwrap();
        assert!(fresh[0].starts_with(b"Exif\0"));
        assert!(fresh[1].starts_with(XMP_HEADER));

        // And with no EXIF either, it lands first
        let mut bare = vec![scan];
        add_xmp_to_sections(&mut packet, &mut bare).unwrap();
        assert!(bare[0].starts_with(XMP_HEADER));
    }
}
