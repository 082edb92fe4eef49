//! Namespace-aware tree serializer
//!
//! A [`Serializer`] is a view scoped to one node of an [`XmlDocument`],
//! through which metadata elements write their properties. Child views are
//! created per nested element or list item and borrow the same document;
//! the [`NamespaceTable`] is shared read-only across every view of one
//! serialization pass.
//!
//! Repeated elements use the RDF ordered-list convention: a list-container
//! element wraps one `rdf:Seq`, whose `rdf:li` slots each hold one item
//! element.

use crate::core::document::{NodeId, XmlDocument};
use crate::core::error::{DepthError, DepthResult};
use crate::core::namespace::{ns, NamespaceTable};
use log::error;

/// Writer view over one document node
pub struct Serializer<'a> {
    doc: &'a mut XmlDocument,
    namespaces: &'a NamespaceTable,
    node: NodeId,
    /// True when this view is scoped to a bare `rdf:Seq` list wrapper, which
    /// holds only item slots, never properties
    is_list_wrapper: bool,
}

impl<'a> Serializer<'a> {
    /// Create a serializer scoped to the document's `rdf:Description` node.
    ///
    /// The document is expected to carry the standard
    /// `x:xmpmeta / rdf:RDF / rdf:Description` skeleton.
    pub fn from_document(
        doc: &'a mut XmlDocument,
        namespaces: &'a NamespaceTable,
    ) -> DepthResult<Serializer<'a>> {
        let node = doc
            .find_node(ns::RDF_PREFIX, "Description")
            .ok_or_else(|| {
                error!("Document has no rdf:Description node");
                DepthError::BadParam("Document has no rdf:Description node".to_string())
            })?;
        Ok(Serializer {
            doc,
            namespaces,
            node,
            is_list_wrapper: false,
        })
    }

    /// Append one child element and return a view scoped to it.
    ///
    /// A non-empty prefix must already be registered in the namespace table;
    /// prefixes are emitted as document-level declarations, so they have to
    /// be known before any property referencing them is written.
    pub fn create_serializer(&mut self, prefix: &str, name: &str) -> DepthResult<Serializer<'_>> {
        self.check_name(prefix, name)?;
        let child = self.doc.create_node(prefix, name);
        self.doc.append_child(self.node, child);
        Ok(Serializer {
            doc: &mut *self.doc,
            namespaces: self.namespaces,
            node: child,
            is_list_wrapper: false,
        })
    }

    /// Append a list-container element wrapping an empty `rdf:Seq` and
    /// return a view scoped to the list wrapper.
    pub fn create_list_serializer(
        &mut self,
        prefix: &str,
        name: &str,
    ) -> DepthResult<Serializer<'_>> {
        self.check_name(prefix, name)?;
        let container = self.doc.create_node(prefix, name);
        let seq = self.doc.create_node(ns::RDF_PREFIX, "Seq");
        self.doc.append_child(self.node, container);
        self.doc.append_child(container, seq);
        Ok(Serializer {
            doc: &mut *self.doc,
            namespaces: self.namespaces,
            node: seq,
            is_list_wrapper: true,
        })
    }

    /// Append one `rdf:li` item slot holding a new child element, and return
    /// a view scoped to that child. Only legal on a list-wrapper view.
    pub fn create_item_serializer(
        &mut self,
        prefix: &str,
        name: &str,
    ) -> DepthResult<Serializer<'_>> {
        if !self.is_list_wrapper {
            error!("create_item_serializer called outside a list serializer");
            return Err(DepthError::BadParam(
                "Item serializers can only be created from a list serializer".to_string(),
            ));
        }
        self.check_name(prefix, name)?;
        let li = self.doc.create_node(ns::RDF_PREFIX, "li");
        let item = self.doc.create_node(prefix, name);
        self.doc.append_child(self.node, li);
        self.doc.append_child(li, item);
        Ok(Serializer {
            doc: &mut *self.doc,
            namespaces: self.namespaces,
            node: item,
            is_list_wrapper: false,
        })
    }

    /// Set an attribute-style property on the current node.
    ///
    /// Refused on a list-wrapper view: `rdf:Seq` holds item slots only.
    pub fn write_property(&mut self, prefix: &str, name: &str, value: &str) -> DepthResult<()> {
        if self.is_list_wrapper {
            error!("write_property called on a list serializer");
            return Err(DepthError::BadParam(
                "Properties cannot be written on a list node".to_string(),
            ));
        }
        self.check_name(prefix, name)?;
        let qualified = qualify(prefix, name);
        self.doc.node_mut(self.node).set_attribute(&qualified, value);
        Ok(())
    }

    /// Set a boolean property, written as the literal `true` / `false`
    pub fn write_bool_property(&mut self, prefix: &str, name: &str, value: bool) -> DepthResult<()> {
        self.write_property(prefix, name, if value { "true" } else { "false" })
    }

    /// Write a small integer sequence as a plain-text `rdf:Seq` list
    /// (not base64), e.g. a camera-index list
    pub fn write_int_array(&mut self, prefix: &str, name: &str, values: &[i32]) -> DepthResult<()> {
        let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.write_text_list(prefix, name, &items)
    }

    /// Write a small double sequence as a plain-text `rdf:Seq` list
    pub fn write_double_array(
        &mut self,
        prefix: &str,
        name: &str,
        values: &[f64],
    ) -> DepthResult<()> {
        let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.write_text_list(prefix, name, &items)
    }

    fn write_text_list(&mut self, prefix: &str, name: &str, items: &[String]) -> DepthResult<()> {
        if self.is_list_wrapper {
            error!("array write called on a list serializer");
            return Err(DepthError::BadParam(
                "Arrays cannot be written on a list node".to_string(),
            ));
        }
        self.check_name(prefix, name)?;
        let container = self.doc.create_node(prefix, name);
        let seq = self.doc.create_node(ns::RDF_PREFIX, "Seq");
        self.doc.append_child(self.node, container);
        self.doc.append_child(container, seq);
        for item in items {
            let li = self.doc.create_node(ns::RDF_PREFIX, "li");
            self.doc.node_mut(li).text = Some(item.clone());
            self.doc.append_child(seq, li);
        }
        Ok(())
    }

    fn check_name(&self, prefix: &str, name: &str) -> DepthResult<()> {
        if name.is_empty() {
            error!("Empty element or property name");
            return Err(DepthError::BadParam("Name cannot be empty".to_string()));
        }
        // rdf is implicit in every packet; everything else must be declared
        if !prefix.is_empty() && prefix != ns::RDF_PREFIX && !self.namespaces.has_prefix(prefix) {
            error!("Namespace prefix '{}' is not registered", prefix);
            return Err(DepthError::BadParam(format!(
                "Namespace prefix '{}' is not registered",
                prefix
            )));
        }
        Ok(())
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", prefix, name)
    }
}
