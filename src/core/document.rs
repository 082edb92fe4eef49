//! In-memory XML element tree
//!
//! This module defines the document model the tree serializer and
//! deserializer operate on: a flat arena of namespaced element nodes indexed
//! by [`NodeId`]. The arena owns every node; serializer and deserializer
//! views borrow `(document, node id)` pairs and never outlive the document.

/// Index of a node inside its owning [`XmlDocument`]
pub type NodeId = usize;

/// One namespaced element node
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// Namespace prefix, empty for unprefixed elements
    pub prefix: String,
    /// Local element name
    pub name: String,
    /// Attributes as (qualified name, value), in insertion order
    pub attributes: Vec<(String, String)>,
    /// Child element ids, in document order
    pub children: Vec<NodeId>,
    /// Text content, if any
    pub text: Option<String>,
}

impl XmlNode {
    /// Qualified name, `prefix:name` or just `name` when unprefixed
    pub fn qualified_name(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.prefix, self.name)
        }
    }

    /// True if this node's (prefix, name) pair matches
    pub fn matches(&self, prefix: &str, name: &str) -> bool {
        self.prefix == prefix && self.name == name
    }

    /// Look up an attribute value by qualified name
    pub fn attribute(&self, qualified_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == qualified_name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value for the same name
    pub fn set_attribute(&mut self, qualified_name: &str, value: &str) {
        if let Some(attr) = self.attributes.iter_mut().find(|(k, _)| k == qualified_name) {
            attr.1 = value.to_string();
        } else {
            self.attributes
                .push((qualified_name.to_string(), value.to_string()));
        }
    }
}

/// Arena-backed XML document.
///
/// Nodes are created detached and wired into the tree with
/// [`XmlDocument::append_child`]. The document is the single owner of its
/// backing store; dropping it drops every node.
#[derive(Debug, Clone, Default)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    root: Option<NodeId>,
}

impl XmlDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element node and return its id
    pub fn create_node(&mut self, prefix: &str, name: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(XmlNode {
            prefix: prefix.to_string(),
            name: name.to_string(),
            ..XmlNode::default()
        });
        id
    }

    /// Document root, if set
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Set the document root
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id]
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, id: NodeId) -> &mut XmlNode {
        &mut self.nodes[id]
    }

    /// Append `child` to `parent`'s child list
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
    }

    /// Find the first descendant of `start` matching (prefix, name), using a
    /// pre-order depth-first search. `start` itself is not a candidate.
    pub fn find_descendant(&self, start: NodeId, prefix: &str, name: &str) -> Option<NodeId> {
        for &child in &self.nodes[start].children {
            if self.nodes[child].matches(prefix, name) {
                return Some(child);
            }
            if let Some(found) = self.find_descendant(child, prefix, name) {
                return Some(found);
            }
        }
        None
    }

    /// Find the first node matching (prefix, name) anywhere in the document,
    /// the root included
    pub fn find_node(&self, prefix: &str, name: &str) -> Option<NodeId> {
        let root = self.root?;
        if self.nodes[root].matches(prefix, name) {
            return Some(root);
        }
        self.find_descendant(root, prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_sample() -> XmlDocument {
        // <x:xmpmeta><rdf:RDF><rdf:Description><Device:Cameras/></rdf:Description></rdf:RDF></x:xmpmeta>
        let mut doc = XmlDocument::new();
        let meta = doc.create_node("x", "xmpmeta");
        let rdf = doc.create_node("rdf", "RDF");
        let desc = doc.create_node("rdf", "Description");
        let cameras = doc.create_node("Device", "Cameras");
        doc.set_root(meta);
        doc.append_child(meta, rdf);
        doc.append_child(rdf, desc);
        doc.append_child(desc, cameras);
        doc
    }

    #[test]
    fn test_qualified_name() {
        let mut doc = XmlDocument::new();
        let a = doc.create_node("rdf", "Seq");
        let b = doc.create_node("", "plain");
        assert_eq!(doc.node(a).qualified_name(), "rdf:Seq");
        assert_eq!(doc.node(b).qualified_name(), "plain");
    }

    #[test]
    fn test_attributes() {
        let mut doc = XmlDocument::new();
        let id = doc.create_node("Camera", "Camera");
        doc.node_mut(id).set_attribute("Camera:Trait", "Physical");
        assert_eq!(doc.node(id).attribute("Camera:Trait"), Some("Physical"));
        doc.node_mut(id).set_attribute("Camera:Trait", "Logical");
        assert_eq!(doc.node(id).attribute("Camera:Trait"), Some("Logical"));
        assert_eq!(doc.node(id).attributes.len(), 1);
        assert_eq!(doc.node(id).attribute("Camera:Other"), None);
    }

    #[test]
    fn test_find_descendant_depth_first() {
        let doc = build_sample();
        let root = doc.root().unwrap();
        let desc = doc.find_descendant(root, "rdf", "Description").unwrap();
        assert!(doc.node(desc).matches("rdf", "Description"));
        let cameras = doc.find_descendant(root, "Device", "Cameras").unwrap();
        assert!(doc.node(cameras).matches("Device", "Cameras"));
        assert!(doc.find_descendant(root, "Device", "Missing").is_none());
    }

    #[test]
    fn test_find_node_includes_root() {
        let doc = build_sample();
        assert_eq!(doc.find_node("x", "xmpmeta"), doc.root());
    }
}
