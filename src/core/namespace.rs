//! Namespace management for Dynamic Depth metadata
//!
//! Dynamic Depth properties live in a family of per-element namespaces
//! (Device, Camera, DepthMap, ...) plus the Adobe/RDF infrastructure
//! namespaces. A [`NamespaceTable`] maps short prefixes to full URIs and is
//! owned by one serialization pass: it is built before any property is
//! written (prefixes become document-level `xmlns` declarations) and is
//! shared read-only by every serializer view created within that pass.

use crate::core::error::{DepthError, DepthResult};
use std::collections::BTreeMap;

/// Well-known namespace URIs and prefixes
pub mod ns {
    /// Dynamic Depth Device namespace
    pub const DEVICE: &str = "http://ns.google.com/photos/dd/1.0/device/";
    /// Dynamic Depth Camera namespace
    pub const CAMERA: &str = "http://ns.google.com/photos/dd/1.0/camera/";
    /// Dynamic Depth Image namespace
    pub const IMAGE: &str = "http://ns.google.com/photos/dd/1.0/image/";
    /// Dynamic Depth DepthMap namespace
    pub const DEPTH_MAP: &str = "http://ns.google.com/photos/dd/1.0/depthmap/";
    /// Dynamic Depth Pose namespace
    pub const POSE: &str = "http://ns.google.com/photos/dd/1.0/pose/";
    /// Dynamic Depth EarthPose namespace
    pub const EARTH_POSE: &str = "http://ns.google.com/photos/dd/1.0/earthpose/";
    /// Dynamic Depth Plane namespace
    pub const PLANE: &str = "http://ns.google.com/photos/dd/1.0/plane/";
    /// Dynamic Depth PointCloud namespace
    pub const POINT_CLOUD: &str = "http://ns.google.com/photos/dd/1.0/pointcloud/";
    /// Dynamic Depth ImagingModel namespace
    pub const IMAGING_MODEL: &str = "http://ns.google.com/photos/dd/1.0/imagingmodel/";
    /// Dynamic Depth VendorInfo namespace
    pub const VENDOR_INFO: &str = "http://ns.google.com/photos/dd/1.0/vendorinfo/";
    /// Dynamic Depth AppInfo namespace
    pub const APP_INFO: &str = "http://ns.google.com/photos/dd/1.0/appinfo/";
    /// Dynamic Depth LightEstimate namespace
    pub const LIGHT_ESTIMATE: &str = "http://ns.google.com/photos/dd/1.0/lightestimate/";
    /// Dynamic Depth Profile namespace
    pub const PROFILE: &str = "http://ns.google.com/photos/dd/1.0/profile/";
    /// Container namespace (trailing file directory)
    pub const CONTAINER: &str = "http://ns.google.com/photos/dd/1.0/container/";
    /// Container Item namespace
    pub const ITEM: &str = "http://ns.google.com/photos/dd/1.0/item/";
    /// RDF namespace
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// Adobe xmpmeta namespace
    pub const X: &str = "adobe:ns:meta/";
    /// XMP Note namespace (carries the HasExtendedXMP link)
    pub const XMP_NOTE: &str = "http://ns.adobe.com/xmp/note/";

    /// RDF prefix
    pub const RDF_PREFIX: &str = "rdf";
    /// Adobe xmpmeta prefix
    pub const X_PREFIX: &str = "x";
    /// XMP Note prefix
    pub const XMP_NOTE_PREFIX: &str = "xmpNote";
}

/// Prefix-to-URI mapping shared read-only across one serialization pass.
///
/// Iteration order is the prefix's lexicographic order, which keeps the
/// emitted `xmlns` declarations deterministic.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    prefix_to_uri: BTreeMap<String, String>,
}

impl NamespaceTable {
    /// Create an empty namespace table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefix for a namespace URI.
    ///
    /// Re-registering the same prefix with the same URI is a no-op; binding
    /// an existing prefix to a different URI is a caller error.
    pub fn register(&mut self, prefix: &str, uri: &str) -> DepthResult<()> {
        if prefix.is_empty() {
            return Err(DepthError::BadParam("Prefix cannot be empty".to_string()));
        }
        if uri.is_empty() {
            return Err(DepthError::BadParam("URI cannot be empty".to_string()));
        }
        if let Some(existing) = self.prefix_to_uri.get(prefix) {
            if existing != uri {
                return Err(DepthError::BadParam(format!(
                    "Prefix '{}' is already registered to '{}'",
                    prefix, existing
                )));
            }
            return Ok(());
        }
        self.prefix_to_uri.insert(prefix.to_string(), uri.to_string());
        Ok(())
    }

    /// Get the URI registered for a prefix
    pub fn get_uri(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(|s| s.as_str())
    }

    /// Check whether a prefix is registered
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix_to_uri.contains_key(prefix)
    }

    /// Iterate all (prefix, uri) pairs in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_uri
            .iter()
            .map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Number of registered prefixes
    pub fn len(&self) -> usize {
        self.prefix_to_uri.len()
    }

    /// True if no prefix is registered
    pub fn is_empty(&self) -> bool {
        self.prefix_to_uri.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut table = NamespaceTable::new();
        table.register("Device", ns::DEVICE).unwrap();
        assert_eq!(table.get_uri("Device"), Some(ns::DEVICE));
        assert!(table.has_prefix("Device"));
        assert!(!table.has_prefix("Camera"));
    }

    #[test]
    fn test_register_duplicate_prefix() {
        let mut table = NamespaceTable::new();
        table.register("Item", ns::ITEM).unwrap();
        // Same pair is a no-op
        assert!(table.register("Item", ns::ITEM).is_ok());
        // Rebinding to a different URI is refused
        assert!(table.register("Item", ns::CONTAINER).is_err());
    }

    #[test]
    fn test_register_empty() {
        let mut table = NamespaceTable::new();
        assert!(table.register("", ns::DEVICE).is_err());
        assert!(table.register("Device", "").is_err());
    }

    #[test]
    fn test_iteration_order() {
        let mut table = NamespaceTable::new();
        table.register("Camera", ns::CAMERA).unwrap();
        table.register("Device", ns::DEVICE).unwrap();
        table.register("AppInfo", ns::APP_INFO).unwrap();
        let prefixes: Vec<&str> = table.iter().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["AppInfo", "Camera", "Device"]);
    }
}
