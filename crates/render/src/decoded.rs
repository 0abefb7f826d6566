//! Decoded tile payload contract
//!
//! The decode pipeline produces a `DecodedTile` per tile: the renderable
//! geometry, optional explicit bounds, and decode metadata. The tile system
//! consumes it without knowing anything about the wire format it came from.

use crate::object::RenderObject;
use atlas_geo::OrientedBox;
use std::time::Duration;

/// Result of decoding one tile's payload.
///
/// A payload with an empty `objects` list is a legitimate outcome: the tile
/// decoded successfully but contains nothing visible at this level.
#[derive(Debug, Default)]
pub struct DecodedTile {
    /// Renderable geometry decoded from the payload, possibly empty
    pub objects: Vec<RenderObject>,

    /// Explicit world-space bounds supplied by the decoder.
    ///
    /// When present these are authoritative and the tile never re-derives
    /// bounds from its geographic box.
    pub bounding_box: Option<OrientedBox>,

    /// Tallest geometry above terrain in meters, when the decoder did not
    /// supply explicit bounds
    pub max_geometry_height: Option<f64>,

    /// Copyright/attribution identifiers carried by the payload
    pub attributions: Vec<String>,

    /// Raw payload size in bytes, as reported by the source
    pub payload_bytes: Option<usize>,

    /// Time spent decoding, for diagnostics
    pub decode_duration: Option<Duration>,
}

impl DecodedTile {
    /// Create an empty decoded payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderable object, builder style
    pub fn with_object(mut self, object: RenderObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Set explicit world-space bounds, builder style
    pub fn with_bounding_box(mut self, bounding_box: OrientedBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Set the maximum geometry height, builder style
    pub fn with_max_geometry_height(mut self, height: f64) -> Self {
        self.max_geometry_height = Some(height);
        self
    }

    /// Add an attribution identifier, builder style
    pub fn with_attribution(mut self, id: impl Into<String>) -> Self {
        self.attributions.push(id.into());
        self
    }

    /// Set the reported payload size, builder style
    pub fn with_payload_bytes(mut self, bytes: usize) -> Self {
        self.payload_bytes = Some(bytes);
        self
    }

    /// Set the decode duration, builder style
    pub fn with_decode_duration(mut self, duration: Duration) -> Self {
        self.decode_duration = Some(duration);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_builders() {
        let decoded = DecodedTile::new()
            .with_object(RenderObject::new("buildings"))
            .with_max_geometry_height(80.0)
            .with_attribution("osm")
            .with_payload_bytes(4096)
            .with_decode_duration(Duration::from_millis(7));

        assert_eq!(decoded.objects.len(), 1);
        assert_eq!(decoded.max_geometry_height, Some(80.0));
        assert_eq!(decoded.attributions, ["osm"]);
        assert_eq!(decoded.payload_bytes, Some(4096));
        assert!(decoded.bounding_box.is_none());
    }

    #[test]
    fn test_explicit_bounds() {
        let bounds = OrientedBox::axis_aligned(DVec3::ZERO, DVec3::splat(10.0));
        let decoded = DecodedTile::new().with_bounding_box(bounds);
        assert_eq!(decoded.bounding_box, Some(bounds));
    }
}
