//! File-level entry points
//!
//! Thin wrappers tying the section scanner and the packet protocol to real
//! files and in-memory buffers. The write path serializes the packet into
//! the primary image's section list, writes the JPEG, then appends each
//! trailing container payload verbatim in the order the items are declared.

use crate::core::error::{DepthError, DepthResult};
use crate::files::jpeg::{parse_sections, write_sections, ParseOptions};
use crate::files::xmp::{add_xmp_to_sections, extract_xmp, XmpPacket};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

/// Read the XMP packet from a JPEG stream.
///
/// The standard section is required; the extended section is optional.
pub fn read_xmp<R: Read + Seek>(reader: &mut R) -> DepthResult<XmpPacket> {
    extract_xmp(reader)
}

/// Read the XMP packet from an in-memory JPEG buffer
pub fn read_xmp_from_buffer(data: &[u8]) -> DepthResult<XmpPacket> {
    extract_xmp(&mut Cursor::new(data))
}

/// Read the XMP packet from a JPEG file on disk
pub fn read_xmp_from_file<P: AsRef<Path>>(path: P) -> DepthResult<XmpPacket> {
    let mut reader = BufReader::new(File::open(path)?);
    extract_xmp(&mut reader)
}

/// Write a primary image plus metadata plus trailing container payloads.
///
/// Parses the primary image's sections in full, splices the packet in,
/// writes the resulting JPEG, then appends each container payload raw.
pub fn write_image_and_metadata<R: Read + Seek, W: Write>(
    image: &mut R,
    packet: &mut XmpPacket,
    container_payloads: &[Vec<u8>],
    writer: &mut W,
) -> DepthResult<()> {
    let mut sections = parse_sections(image, &ParseOptions::default());
    if sections.is_empty() {
        return Err(DepthError::BadValue(
            "Primary image is not a well-formed JPEG".to_string(),
        ));
    }
    add_xmp_to_sections(packet, &mut sections)?;
    write_sections(&sections, writer)?;
    for payload in container_payloads {
        writer.write_all(payload)?;
    }
    Ok(())
}

/// Path convenience over [`write_image_and_metadata`]
pub fn write_image_and_metadata_to_file<P: AsRef<Path>, Q: AsRef<Path>>(
    image_path: P,
    packet: &mut XmpPacket,
    container_payloads: &[Vec<u8>],
    output_path: Q,
) -> DepthResult<()> {
    let mut reader = BufReader::new(File::open(image_path)?);
    let mut writer = BufWriter::new(File::create(output_path)?);
    write_image_and_metadata(&mut reader, packet, container_payloads, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deserializer::Deserializer;
    use crate::core::namespace::{ns, NamespaceTable};
    use crate::core::serializer::Serializer;
    use crate::files::jpeg::{MARKER_SOS, Section};
    use pretty_assertions::assert_eq;

    fn minimal_jpeg() -> Vec<u8> {
        let scan = Section {
            marker: MARKER_SOS,
            is_image_data: true,
            payload: vec![0x01, 0x02, 0xFF, 0xD9],
        };
        let mut bytes = Vec::new();
        write_sections(&[scan], &mut bytes).unwrap();
        bytes
    }

    fn device_packet(table: &NamespaceTable, revision: &str) -> XmpPacket {
        let mut packet = XmpPacket::new(table, false);
        {
            let mut serializer = Serializer::from_document(&mut packet.standard, table).unwrap();
            serializer
                .write_property("Device", "Revision", revision)
                .unwrap();
        }
        packet
    }

    #[test]
    fn test_write_then_read_buffer() {
        let mut table = NamespaceTable::new();
        table.register("Device", ns::DEVICE).unwrap();
        let mut packet = device_packet(&table, "1.0");

        let mut out = Vec::new();
        write_image_and_metadata(
            &mut Cursor::new(minimal_jpeg()),
            &mut packet,
            &[],
            &mut out,
        )
        .unwrap();

        let parsed = read_xmp_from_buffer(&out).unwrap();
        let deserializer = Deserializer::from_document(&parsed.standard).unwrap();
        assert_eq!(
            deserializer.parse_string("Device", "Revision"),
            Some("1.0".to_string())
        );
    }

    #[test]
    fn test_container_payloads_appended_in_order() {
        let mut table = NamespaceTable::new();
        table.register("Device", ns::DEVICE).unwrap();
        let mut packet = device_packet(&table, "1.0");

        let payloads = vec![b"first-item".to_vec(), b"second-item".to_vec()];
        let mut out = Vec::new();
        write_image_and_metadata(
            &mut Cursor::new(minimal_jpeg()),
            &mut packet,
            &payloads,
            &mut out,
        )
        .unwrap();

        let tail = &out[out.len() - 21..];
        assert_eq!(tail, b"first-itemsecond-item");
        // The JPEG in front of the tail still parses
        assert!(read_xmp_from_buffer(&out[..out.len() - 21]).is_ok());
    }

    #[test]
    fn test_write_rejects_non_jpeg() {
        let mut table = NamespaceTable::new();
        table.register("Device", ns::DEVICE).unwrap();
        let mut packet = device_packet(&table, "1.0");

        let mut out = Vec::new();
        let result = write_image_and_metadata(
            &mut Cursor::new(b"not a jpeg".to_vec()),
            &mut packet,
            &[],
            &mut out,
        );
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.jpg");
        let output = dir.path().join("output.jpg");
        std::fs::write(&input, minimal_jpeg()).unwrap();

        let mut table = NamespaceTable::new();
        table.register("Device", ns::DEVICE).unwrap();
        let mut packet = device_packet(&table, "2.0");

        write_image_and_metadata_to_file(&input, &mut packet, &[], &output).unwrap();

        let parsed = read_xmp_from_file(&output).unwrap();
        let deserializer = Deserializer::from_document(&parsed.standard).unwrap();
        assert_eq!(
            deserializer.parse_string("Device", "Revision"),
            Some("2.0".to_string())
        );
    }
}
