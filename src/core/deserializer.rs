//! Namespace-aware tree deserializer
//!
//! A [`Deserializer`] is a read-only view scoped to one node of a parsed
//! [`XmlDocument`]. Absent properties and children are "not found" (`None`),
//! never errors: metadata element factories probe for optional structure all
//! the time.
//!
//! The view is immutable after construction except for one field: the most
//! recently resolved list-container node is cached to avoid redundant tree
//! searches across repeated indexed access to the same list. That cache is
//! the single piece of shared mutable state and sits behind a `Mutex` so the
//! view can be queried from multiple threads.

use crate::core::base64;
use crate::core::document::{NodeId, XmlDocument};
use crate::core::namespace::ns;
use std::str::FromStr;
use std::sync::Mutex;

/// Reader view over one document node
pub struct Deserializer<'a> {
    doc: &'a XmlDocument,
    node: NodeId,
    /// Last resolved list container, keyed by qualified name
    list_cache: Mutex<Option<(String, NodeId)>>,
}

impl<'a> Deserializer<'a> {
    /// Create a deserializer scoped to the document's `rdf:Description`
    /// node, or `None` if the document has no such node
    pub fn from_document(doc: &'a XmlDocument) -> Option<Deserializer<'a>> {
        let node = doc.find_node(ns::RDF_PREFIX, "Description")?;
        Some(Self::scoped(doc, node))
    }

    fn scoped(doc: &'a XmlDocument, node: NodeId) -> Deserializer<'a> {
        Deserializer {
            doc,
            node,
            list_cache: Mutex::new(None),
        }
    }

    /// View scoped to the first descendant matching (prefix, name) in
    /// document order, or `None` if absent
    pub fn create_deserializer(&self, prefix: &str, child_name: &str) -> Option<Deserializer<'a>> {
        let found = self.doc.find_descendant(self.node, prefix, child_name)?;
        Some(Self::scoped(self.doc, found))
    }

    /// View scoped to the `index`-th item slot of the named ordered list.
    ///
    /// Resolves the list-container node, its `rdf:Seq` wrapper, then the
    /// zero-based `rdf:li` slot; any miss, including an out-of-range index,
    /// is `None`. The resolved container is cached for repeated calls
    /// against the same list.
    pub fn create_deserializer_from_list_element_at(
        &self,
        prefix: &str,
        list_name: &str,
        index: usize,
    ) -> Option<Deserializer<'a>> {
        let container = self.resolve_list_container(prefix, list_name)?;
        let seq = self.first_child_matching(container, ns::RDF_PREFIX, "Seq")?;
        let li = self
            .doc
            .node(seq)
            .children
            .iter()
            .filter(|&&c| self.doc.node(c).matches(ns::RDF_PREFIX, "li"))
            .nth(index)?;
        Some(Self::scoped(self.doc, *li))
    }

    /// Read a string property: attribute form first, falling back to the
    /// text content of a matching child element
    pub fn parse_string(&self, prefix: &str, name: &str) -> Option<String> {
        let qualified = qualify(prefix, name);
        if let Some(value) = self.doc.node(self.node).attribute(&qualified) {
            return Some(value.to_string());
        }
        let child = self.doc.find_descendant(self.node, prefix, name)?;
        self.doc.node(child).text.clone()
    }

    /// Read a 32-bit integer property
    pub fn parse_int(&self, prefix: &str, name: &str) -> Option<i32> {
        self.parse_number(prefix, name)
    }

    /// Read a 64-bit integer property
    pub fn parse_long(&self, prefix: &str, name: &str) -> Option<i64> {
        self.parse_number(prefix, name)
    }

    /// Read a 32-bit float property
    pub fn parse_float(&self, prefix: &str, name: &str) -> Option<f32> {
        self.parse_number(prefix, name)
    }

    /// Read a 64-bit float property
    pub fn parse_double(&self, prefix: &str, name: &str) -> Option<f64> {
        self.parse_number(prefix, name)
    }

    /// Read a boolean property. Only the literal strings `true` / `false`
    /// are accepted, case-insensitively.
    pub fn parse_boolean(&self, prefix: &str, name: &str) -> Option<bool> {
        let value = self.parse_string(prefix, name)?;
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    /// Read an integer sequence stored as plain-text `rdf:Seq` items
    pub fn parse_int_array(&self, prefix: &str, name: &str) -> Option<Vec<i32>> {
        self.parse_text_list(prefix, name)
    }

    /// Read a double sequence stored as plain-text `rdf:Seq` items
    pub fn parse_double_array(&self, prefix: &str, name: &str) -> Option<Vec<f64>> {
        self.parse_text_list(prefix, name)
    }

    /// Read a base64-encoded 32-bit integer array property
    pub fn parse_int_array_base64(&self, prefix: &str, name: &str) -> Option<Vec<i32>> {
        let value = self.parse_string(prefix, name)?;
        base64::decode_int_array(&value).ok()
    }

    /// Read a base64-encoded 32-bit float array property
    pub fn parse_float_array_base64(&self, prefix: &str, name: &str) -> Option<Vec<f32>> {
        let value = self.parse_string(prefix, name)?;
        base64::decode_float_array(&value).ok()
    }

    /// Read a base64-encoded 64-bit float array property
    pub fn parse_double_array_base64(&self, prefix: &str, name: &str) -> Option<Vec<f64>> {
        let value = self.parse_string(prefix, name)?;
        base64::decode_double_array(&value).ok()
    }

    fn parse_number<T: FromStr>(&self, prefix: &str, name: &str) -> Option<T> {
        self.parse_string(prefix, name)
            .and_then(|s| s.parse().ok())
    }

    fn parse_text_list<T: FromStr>(&self, prefix: &str, name: &str) -> Option<Vec<T>> {
        let container = self.doc.find_descendant(self.node, prefix, name)?;
        let seq = self.first_child_matching(container, ns::RDF_PREFIX, "Seq")?;
        let mut values = Vec::new();
        for &li in &self.doc.node(seq).children {
            if !self.doc.node(li).matches(ns::RDF_PREFIX, "li") {
                continue;
            }
            let text = self.doc.node(li).text.as_deref()?;
            values.push(text.trim().parse().ok()?);
        }
        Some(values)
    }

    fn first_child_matching(&self, parent: NodeId, prefix: &str, name: &str) -> Option<NodeId> {
        self.doc
            .node(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.doc.node(c).matches(prefix, name))
    }

    fn resolve_list_container(&self, prefix: &str, list_name: &str) -> Option<NodeId> {
        let qualified = qualify(prefix, list_name);
        // A poisoned cache only loses memoization, never correctness
        let mut cache = self
            .list_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((cached_name, cached_node)) = cache.as_ref() {
            if *cached_name == qualified {
                return Some(*cached_node);
            }
        }
        let found = self.doc.find_descendant(self.node, prefix, list_name)?;
        *cache = Some((qualified, found));
        Some(found)
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", prefix, name)
    }
}
