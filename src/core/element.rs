//! Contract implemented by every metadata element type
//!
//! Element types (Device, Camera, DepthMap, ...) sit on top of the tree
//! serializer and contribute no transport or tree-walking logic of their
//! own, only field-level validation:
//!
//! - a missing required field makes the type's deserializing factory return
//!   "not found" rather than a partially populated instance;
//! - a missing optional field is simply omitted from serialization, never
//!   written as an empty placeholder;
//! - mutually dependent optional groups (e.g. a position is either three
//!   full coordinates or entirely absent) are validated atomically.
//!
//! Deserialization is not part of the trait: each type provides its own
//! static factory taking a [`Deserializer`](crate::Deserializer) view and
//! returning either a populated instance or `None`.

use crate::core::error::DepthResult;
use crate::core::namespace::NamespaceTable;
use crate::core::serializer::Serializer;

/// One serializable metadata element
pub trait Element {
    /// Contribute this element's (prefix, URI) pair to the table and
    /// recursively invoke the same on every child element it owns.
    ///
    /// Runs before serialization begins: namespace names must be known
    /// before any property referencing them is written.
    fn namespaces(&self, table: &mut NamespaceTable);

    /// Write this element's properties through the serializer contract,
    /// recursing into child elements via newly created child or list views
    fn serialize(&self, serializer: &mut Serializer<'_>) -> DepthResult<()>;
}
