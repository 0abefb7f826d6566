//! Shared render resources
//!
//! Geometry buffers, textures and materials carry a process-unique
//! `ResourceId` so that resources shared between renderables (or between
//! tiles, such as a texture atlas) can be deduplicated by identity during
//! resource accounting and checked against a tile's owned-resource registry
//! before release.
//!
//! Disposal marks the resource released; it is idempotent per resource. Who
//! is allowed to call it is decided by the owning tile, not by the resource.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-unique resource identity, used as a deduplication key
pub type ResourceId = u64;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_resource_id() -> ResourceId {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Estimated heap footprint of one material's own state (excluding textures)
pub const MATERIAL_BYTES: usize = 256;

/// A geometry buffer set: vertices, indices and optional extra attributes.
#[derive(Debug)]
pub struct Geometry {
    id: ResourceId,
    vertex_bytes: usize,
    index_bytes: usize,
    attribute_bytes: usize,
    disposed: AtomicBool,
}

impl Geometry {
    /// Create a new geometry with the given buffer sizes
    pub fn new(vertex_bytes: usize, index_bytes: usize) -> Self {
        Self {
            id: next_resource_id(),
            vertex_bytes,
            index_bytes,
            attribute_bytes: 0,
            disposed: AtomicBool::new(false),
        }
    }

    /// Add extra attribute buffer bytes, builder style
    pub fn with_attribute_bytes(mut self, attribute_bytes: usize) -> Self {
        self.attribute_bytes = attribute_bytes;
        self
    }

    /// Resource identity of this geometry
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Estimated GPU footprint of all buffers in bytes
    pub fn estimated_bytes(&self) -> usize {
        self.vertex_bytes + self.index_bytes + self.attribute_bytes
    }

    /// Release the geometry buffers. Idempotent.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    /// Whether this geometry has been released
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// A texture resource.
///
/// Textures may be shared across tiles (e.g. a glyph or icon atlas); a tile
/// only releases textures it has explicitly registered as owned.
#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    disposed: AtomicBool,
}

impl Texture {
    /// Create a new RGBA texture
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_bytes_per_pixel(width, height, 4)
    }

    /// Create a texture with a custom pixel size
    pub fn with_bytes_per_pixel(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        Self {
            id: next_resource_id(),
            width,
            height,
            bytes_per_pixel,
            disposed: AtomicBool::new(false),
        }
    }

    /// Resource identity of this texture
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Estimated GPU footprint in bytes
    pub fn estimated_bytes(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.bytes_per_pixel as usize)
    }

    /// Release the texture. Idempotent.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    /// Whether this texture has been released
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// A material referencing zero or more textures.
///
/// Disposing a material never disposes its textures; texture release is
/// gated by the owning tile's registry.
#[derive(Debug, Default)]
pub struct Material {
    id: ResourceId,
    textures: Vec<std::sync::Arc<Texture>>,
    disposed: AtomicBool,
}

impl Material {
    /// Create a new material with no textures
    pub fn new() -> Self {
        Self {
            id: next_resource_id(),
            textures: Vec::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Attach a texture, builder style
    pub fn with_texture(mut self, texture: std::sync::Arc<Texture>) -> Self {
        self.textures.push(texture);
        self
    }

    /// Resource identity of this material
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Textures referenced by this material
    pub fn textures(&self) -> &[std::sync::Arc<Texture>] {
        &self.textures
    }

    /// Estimated heap footprint of the material's own state in bytes
    pub fn estimated_bytes(&self) -> usize {
        MATERIAL_BYTES
    }

    /// Release the material. Idempotent; does not touch textures.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    /// Whether this material has been released
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_resource_ids_unique() {
        let a = Geometry::new(0, 0);
        let b = Geometry::new(0, 0);
        let t = Texture::new(1, 1);
        let m = Material::new();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), t.id());
        assert_ne!(t.id(), m.id());
    }

    #[test]
    fn test_geometry_estimate() {
        let geometry = Geometry::new(1000, 200).with_attribute_bytes(300);
        assert_eq!(geometry.estimated_bytes(), 1500);
    }

    #[test]
    fn test_texture_estimate() {
        let texture = Texture::new(256, 256);
        assert_eq!(texture.estimated_bytes(), 256 * 256 * 4);

        let luminance = Texture::with_bytes_per_pixel(64, 64, 1);
        assert_eq!(luminance.estimated_bytes(), 64 * 64);
    }

    #[test]
    fn test_dispose_idempotent() {
        let geometry = Geometry::new(10, 10);
        assert!(!geometry.is_disposed());
        geometry.dispose();
        geometry.dispose();
        assert!(geometry.is_disposed());
    }

    #[test]
    fn test_material_dispose_leaves_textures() {
        let texture = Arc::new(Texture::new(16, 16));
        let material = Material::new().with_texture(Arc::clone(&texture));

        material.dispose();
        assert!(material.is_disposed());
        assert!(!texture.is_disposed());
    }
}
