//! Core engine: document model, tree serialization, codecs
//!
//! Everything the JPEG/XMP transport layer and the metadata element types
//! are built on: the error taxonomy, the namespace table, the arena-backed
//! XML document with its parser and writer, the generic tree serializer and
//! deserializer views, and the base64 codec for binary numeric arrays.

pub mod base64;
pub mod deserializer;
pub mod document;
pub mod element;
pub mod error;
pub mod namespace;
pub mod parser;
pub mod serializer;
pub mod writer;

pub use deserializer::Deserializer;
pub use document::{NodeId, XmlDocument, XmlNode};
pub use element::Element;
pub use error::{DepthError, DepthResult};
pub use namespace::{ns, NamespaceTable};
pub use serializer::Serializer;
