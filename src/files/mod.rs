//! JPEG transport for Dynamic Depth metadata
//!
//! The pipeline runs in three layers: [`jpeg`] splits a byte stream into
//! marker-delimited sections, [`xmp`] maps the standard/extended XMP packet
//! protocol onto those sections, and [`io`] exposes the file-level read and
//! write entry points.

pub mod io;
pub mod jpeg;
pub mod xmp;

pub use io::{
    read_xmp, read_xmp_from_buffer, read_xmp_from_file, write_image_and_metadata,
    write_image_and_metadata_to_file,
};
pub use jpeg::{parse_sections, write_sections, ParseOptions, Section};
pub use xmp::{
    add_xmp_to_sections, extract_xmp, extract_xmp_from_sections, has_extended_guid,
    serialize_packet, XmpPacket,
};
