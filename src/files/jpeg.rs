//! JPEG section I/O
//!
//! Splits a JPEG byte stream into an ordered list of marker-delimited
//! sections and re-serializes such a list back into a byte stream. This is
//! deliberately not a JPEG decoder: payloads are opaque bytes, and the scan
//! data following the SOS marker is captured as one terminal section.
//!
//! Malformed input is never fatal here. A stream that does not start with
//! SOI parses to an empty list; a truncated or bad-length section aborts
//! the scan and returns the sections collected so far, since callers may
//! only need the metadata sections that were scanned before the damage.

use crate::core::error::{DepthError, DepthResult};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use std::io::{Read, Seek, SeekFrom, Write};

/// Start of Image
pub const MARKER_SOI: u8 = 0xD8;
/// APP1, carries EXIF and XMP
pub const MARKER_APP1: u8 = 0xE1;
/// Start of Scan, image data follows
pub const MARKER_SOS: u8 = 0xDA;
/// Marker sentinel / padding byte
const MARKER_PAD: u8 = 0xFF;

/// One marker-delimited unit of a JPEG file.
///
/// The leading SOI marker is implicit: parsing consumes it and writing
/// re-emits it, so it never appears in a section list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Marker byte (the value following `0xFF`)
    pub marker: u8,
    /// True only for the final scan section, which has no length prefix and
    /// consumes the remainder of the stream
    pub is_image_data: bool,
    /// Raw payload, excluding the 2-byte length prefix when present
    pub payload: Vec<u8>,
}

impl Section {
    /// True if the payload begins with the given byte prefix
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.payload.len() >= prefix.len() && self.payload[..prefix.len()] == *prefix
    }
}

/// Options controlling a section scan, in the builder style
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Skip (seek over, never buffer) every non-APP1 payload and stop at
    /// SOS without capturing image data
    pub read_meta_only: bool,
    /// Keep only sections whose payload starts with this byte string
    pub section_header: Option<Vec<u8>>,
    /// Stop scanning after the first section the header filter keeps
    pub match_first: bool,
}

impl ParseOptions {
    /// Metadata-only scan: non-APP1 payloads are skipped, image data is not
    /// captured. A performance contract, not a correctness one.
    pub fn read_meta_only(mut self) -> Self {
        self.read_meta_only = true;
        self
    }

    /// Keep only sections whose payload starts with `prefix`
    pub fn with_section_header(mut self, prefix: &[u8]) -> Self {
        self.section_header = Some(prefix.to_vec());
        self
    }

    /// Stop after the first section kept by the header filter
    pub fn match_first(mut self) -> Self {
        self.match_first = true;
        self
    }
}

/// Parse a JPEG stream into an ordered section list.
///
/// Returns an empty list when the stream does not begin with SOI, and a
/// partial list when a section is truncated or carries a bad length prefix.
pub fn parse_sections<R: Read + Seek>(reader: &mut R, options: &ParseOptions) -> Vec<Section> {
    let mut sections = Vec::new();

    let stream_len = match stream_length(reader) {
        Ok(len) => len,
        Err(e) => {
            warn!("Cannot determine stream length: {}", e);
            return sections;
        }
    };

    let mut soi = [0u8; 2];
    if reader.read_exact(&mut soi).is_err() || soi != [MARKER_PAD, MARKER_SOI] {
        warn!("Stream does not begin with a start-of-image marker");
        return sections;
    }

    loop {
        // Skip 0xFF padding; the first non-pad byte is the marker
        let marker = loop {
            match reader.read_u8() {
                Ok(MARKER_PAD) => continue,
                Ok(byte) => break byte,
                Err(_) => return sections,
            }
        };

        if marker == MARKER_SOS {
            // No further sections follow a scan marker
            if !options.read_meta_only {
                let mut payload = Vec::new();
                if reader.read_to_end(&mut payload).is_err() {
                    warn!("Failed to read image data after SOS");
                    return sections;
                }
                sections.push(Section {
                    marker,
                    is_image_data: true,
                    payload,
                });
            }
            return sections;
        }

        let length = match reader.read_u16::<BigEndian>() {
            Ok(length) => length,
            Err(_) => {
                warn!("Truncated section length prefix");
                return sections;
            }
        };
        if length < 2 {
            warn!("Bad section length {} for marker 0x{:02X}", length, marker);
            return sections;
        }
        let data_len = u64::from(length) - 2;

        let position = match reader.stream_position() {
            Ok(position) => position,
            Err(_) => return sections,
        };
        if stream_len - position < data_len {
            warn!(
                "Section 0x{:02X} claims {} payload bytes but only {} remain",
                marker,
                data_len,
                stream_len - position
            );
            return sections;
        }

        if options.read_meta_only && marker != MARKER_APP1 {
            if reader.seek(SeekFrom::Current(data_len as i64)).is_err() {
                return sections;
            }
            continue;
        }

        let mut payload = vec![0u8; data_len as usize];
        if reader.read_exact(&mut payload).is_err() {
            warn!("Truncated payload for marker 0x{:02X}", marker);
            return sections;
        }

        let section = Section {
            marker,
            is_image_data: false,
            payload,
        };
        match &options.section_header {
            Some(prefix) => {
                if section.starts_with(prefix) {
                    sections.push(section);
                    if options.match_first {
                        return sections;
                    }
                }
            }
            None => sections.push(section),
        }
    }
}

/// Write a section list back out as a JPEG stream.
///
/// Emits the SOI marker, then every section with its marker byte and, unless
/// it is the image-data section, a big-endian length of `payload + 2`.
/// Section ordering is the caller's responsibility.
pub fn write_sections<W: Write>(sections: &[Section], writer: &mut W) -> DepthResult<()> {
    writer.write_all(&[MARKER_PAD, MARKER_SOI])?;
    for section in sections {
        writer.write_u8(MARKER_PAD)?;
        writer.write_u8(section.marker)?;
        if !section.is_image_data {
            let length = section.payload.len() + 2;
            if length > u16::MAX as usize {
                return Err(DepthError::BadValue(format!(
                    "Section payload of {} bytes exceeds the marker segment limit",
                    section.payload.len()
                )));
            }
            writer.write_u16::<BigEndian>(length as u16)?;
        }
        writer.write_all(&section.payload)?;
    }
    Ok(())
}

fn stream_length<R: Seek>(reader: &mut R) -> std::io::Result<u64> {
    let position = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(len)
}
