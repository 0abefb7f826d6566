//! Tile resource accounting
//!
//! Estimates the heap and GPU footprint of one tile for the cache manager's
//! memory budget. Sub-resources shared between renderables in the same tile
//! (geometry buffers, materials, textures) are deduplicated by resource
//! identity so shared memory is counted once. The estimate is derived, never
//! authoritative; the tile caches it and invalidates on every structural
//! mutation.

use crate::text_elements::TextElementGroups;
use atlas_render::{RenderObject, ResourceId};
use std::collections::HashSet;

/// Default per-label heap estimate in bytes, calibrated against typical
/// glyph-run and placement state
pub const TEXT_ELEMENT_BYTES: usize = 312;

/// Constants used by resource estimation.
#[derive(Debug, Clone, Copy)]
pub struct EstimationConfig {
    /// Heap bytes charged per label across all priority groups
    pub bytes_per_text_element: usize,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            bytes_per_text_element: TEXT_ELEMENT_BYTES,
        }
    }
}

impl EstimationConfig {
    /// Create a config with default constants
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-label heap estimate
    pub fn with_bytes_per_text_element(mut self, bytes: usize) -> Self {
        self.bytes_per_text_element = bytes;
        self
    }
}

/// Derived estimate of one tile's resource footprint.
///
/// Valid until the next structural mutation of the tile invalidates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileResourceInfo {
    /// Estimated heap usage in bytes
    pub heap_bytes: usize,

    /// Estimated GPU memory usage in bytes
    pub gpu_bytes: usize,

    /// Number of renderable nodes currently flagged visible
    pub visible_object_count: usize,

    /// Number of labels across all priority groups
    pub text_element_count: usize,
}

impl TileResourceInfo {
    /// Combined heap and GPU estimate in bytes
    pub fn memory_usage(&self) -> usize {
        self.heap_bytes + self.gpu_bytes
    }
}

/// Estimate the resource footprint of a tile's current state.
///
/// Pure and synchronous; reads only the references it is given.
pub fn estimate_tile_resources(
    objects: &[RenderObject],
    text_elements: &TextElementGroups,
    payload_bytes: Option<usize>,
    config: &EstimationConfig,
) -> TileResourceInfo {
    let mut info = TileResourceInfo::default();
    let mut seen: HashSet<ResourceId> = HashSet::new();

    for object in objects {
        object.for_each(&mut |node| {
            if node.visible {
                info.visible_object_count += 1;
            }
            if let Some(geometry) = &node.geometry {
                if seen.insert(geometry.id()) {
                    info.gpu_bytes += geometry.estimated_bytes();
                }
            }
            for material in &node.materials {
                if seen.insert(material.id()) {
                    info.heap_bytes += material.estimated_bytes();
                    for texture in material.textures() {
                        if seen.insert(texture.id()) {
                            info.gpu_bytes += texture.estimated_bytes();
                        }
                    }
                }
            }
        });
    }

    info.text_element_count = text_elements.element_count();
    info.heap_bytes += info.text_element_count * config.bytes_per_text_element;
    info.heap_bytes += payload_bytes.unwrap_or(0);

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_elements::TileTextElements;
    use atlas_render::{Geometry, Material, TextElement, Texture};
    use std::sync::Arc;

    #[test]
    fn test_shared_material_counted_once() {
        let material = Arc::new(Material::new());
        let a = RenderObject::new("a").with_material(Arc::clone(&material));
        let b = RenderObject::new("b").with_material(Arc::clone(&material));

        let info = estimate_tile_resources(
            &[a, b],
            &TextElementGroups::default(),
            None,
            &EstimationConfig::default(),
        );
        assert_eq!(info.heap_bytes, material.estimated_bytes());
    }

    #[test]
    fn test_shared_geometry_counted_once() {
        let geometry = Arc::new(Geometry::new(1000, 500));
        let a = RenderObject::new("a").with_geometry(Arc::clone(&geometry));
        let b = RenderObject::new("b").with_geometry(Arc::clone(&geometry));
        let c = RenderObject::new("c").with_geometry(Arc::new(Geometry::new(100, 0)));

        let info = estimate_tile_resources(
            &[a, b, c],
            &TextElementGroups::default(),
            None,
            &EstimationConfig::default(),
        );
        assert_eq!(info.gpu_bytes, 1500 + 100);
    }

    #[test]
    fn test_texture_shared_between_materials_counted_once() {
        let atlas = Arc::new(Texture::new(512, 512));
        let m1 = Arc::new(Material::new().with_texture(Arc::clone(&atlas)));
        let m2 = Arc::new(Material::new().with_texture(Arc::clone(&atlas)));
        let object = RenderObject::new("labels")
            .with_material(m1)
            .with_material(m2);

        let info = estimate_tile_resources(
            &[object],
            &TextElementGroups::default(),
            None,
            &EstimationConfig::default(),
        );
        assert_eq!(info.gpu_bytes, atlas.estimated_bytes());
    }

    #[test]
    fn test_visible_count_walks_descendants() {
        let mut hidden = RenderObject::new("hidden");
        hidden.visible = false;
        let tree = RenderObject::new("root")
            .with_child(RenderObject::new("a"))
            .with_child(hidden);

        let info = estimate_tile_resources(
            &[tree],
            &TextElementGroups::default(),
            None,
            &EstimationConfig::default(),
        );
        assert_eq!(info.visible_object_count, 2);
    }

    #[test]
    fn test_labels_and_payload_counted() {
        let mut store = TileTextElements::new();
        store.add(Arc::new(TextElement::new("a", 1)));
        store.add(Arc::new(TextElement::new("b", 2)));

        let config = EstimationConfig::new().with_bytes_per_text_element(100);
        let info = estimate_tile_resources(&[], store.groups(), Some(4096), &config);

        assert_eq!(info.text_element_count, 2);
        assert_eq!(info.heap_bytes, 200 + 4096);
        assert_eq!(info.memory_usage(), 200 + 4096);
    }
}
