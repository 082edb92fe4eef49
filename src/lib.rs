//! # depthmeta
//!
//! Pure Rust reader/writer for Dynamic Depth metadata embedded in JPEG
//! files, using the Adobe XMP packet convention as the carrier format.
//!
//! The crate covers the metadata transport and the generic tree
//! serialization engine:
//!
//! - [`files::jpeg`]: JPEG section I/O, a JPEG as an ordered sequence of
//!   marker-delimited sections, and back.
//! - [`files::xmp`]: the standard/extended XMP packet protocol, locating
//!   the standard packet, splitting oversized payloads across size-bounded
//!   fragments, and reassembling them via a content hash and byte offsets.
//! - [`core::serializer`] / [`core::deserializer`]: namespace-aware views
//!   for walking a property tree into and out of an XML document.
//! - [`core::base64`]: the codec embedding binary numeric arrays inside
//!   XML attribute values.
//!
//! Concrete metadata element types (Device, Camera, DepthMap, ...) sit on
//! top of this crate through the [`Element`] contract and contribute only
//! field-level validation.
//!
//! ## Example
//!
//! ```no_run
//! use depthmeta::{ns, read_xmp_from_file, Deserializer};
//!
//! let packet = read_xmp_from_file("photo.jpg")?;
//! let root = Deserializer::from_document(&packet.standard)
//!     .ok_or(depthmeta::DepthError::NotFound("no description".into()))?;
//! if let Some(revision) = root.parse_string("Device", "Revision") {
//!     println!("Dynamic Depth revision {revision}");
//! }
//! # Ok::<(), depthmeta::DepthError>(())
//! ```

pub mod core;
pub mod files;

pub use crate::core::{
    ns, Deserializer, DepthError, DepthResult, Element, NamespaceTable, NodeId, Serializer,
    XmlDocument, XmlNode,
};
pub use crate::files::{
    add_xmp_to_sections, extract_xmp, extract_xmp_from_sections, has_extended_guid, parse_sections,
    read_xmp, read_xmp_from_buffer, read_xmp_from_file, serialize_packet, write_image_and_metadata,
    write_image_and_metadata_to_file, write_sections, ParseOptions, Section, XmpPacket,
};
