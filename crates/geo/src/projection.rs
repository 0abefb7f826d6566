//! Projection contract
//!
//! The tile system treats projection math as an external collaborator. The
//! `Projection` trait covers the two conversions the tile record needs: from
//! a tile key to its geographic box, and from a geographic box to a
//! world-space oriented bounding box.

use crate::{GeoBox, OrientedBox, TileKey};
use glam::DVec3;

/// Meters per degree along the equator, used by the plane projection
pub const METERS_PER_DEGREE: f64 = 111_319.49;

/// Conversion between geographic and world coordinates.
pub trait Projection: Send + Sync {
    /// Geographic box covered by a tile
    fn tile_geo_box(&self, key: TileKey) -> GeoBox;

    /// World-space oriented bounding box of a geographic box, including its
    /// altitude extremes
    fn world_box(&self, geo_box: &GeoBox) -> OrientedBox;
}

/// Flat equirectangular projection.
///
/// Maps degrees linearly to world units and altitude directly to the Z axis.
/// Suitable for tests and planar views; real map views plug in their own
/// `Projection`.
#[derive(Debug, Clone, Copy)]
pub struct PlaneProjection {
    /// World units per degree of latitude/longitude
    pub unit_scale: f64,
}

impl PlaneProjection {
    /// Create a plane projection with a custom scale
    pub fn new(unit_scale: f64) -> Self {
        Self { unit_scale }
    }
}

impl Default for PlaneProjection {
    fn default() -> Self {
        Self::new(METERS_PER_DEGREE)
    }
}

impl Projection for PlaneProjection {
    fn tile_geo_box(&self, key: TileKey) -> GeoBox {
        let n = TileKey::rows_at_level(key.level) as f64;
        let latitude_step = 180.0 / n;
        let longitude_step = 360.0 / n;
        GeoBox::new(
            -90.0 + key.row as f64 * latitude_step,
            -180.0 + key.column as f64 * longitude_step,
            -90.0 + (key.row + 1) as f64 * latitude_step,
            -180.0 + (key.column + 1) as f64 * longitude_step,
        )
    }

    fn world_box(&self, geo_box: &GeoBox) -> OrientedBox {
        let (center_lat, center_lon) = geo_box.center();
        let center_alt = (geo_box.min_altitude + geo_box.max_altitude) * 0.5;
        let center = DVec3::new(
            center_lon * self.unit_scale,
            center_lat * self.unit_scale,
            center_alt,
        );
        let extents = DVec3::new(
            geo_box.longitude_span() * 0.5 * self.unit_scale,
            geo_box.latitude_span() * 0.5 * self.unit_scale,
            geo_box.altitude_span() * 0.5,
        );
        OrientedBox::axis_aligned(center, extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_geo_box_root() {
        let projection = PlaneProjection::default();
        let geo_box = projection.tile_geo_box(TileKey::new(0, 0, 0));
        assert_eq!(geo_box.south, -90.0);
        assert_eq!(geo_box.west, -180.0);
        assert_eq!(geo_box.north, 90.0);
        assert_eq!(geo_box.east, 180.0);
    }

    #[test]
    fn test_tile_geo_box_subdivision() {
        let projection = PlaneProjection::default();
        let geo_box = projection.tile_geo_box(TileKey::new(1, 1, 1));
        assert_eq!(geo_box.south, 0.0);
        assert_eq!(geo_box.west, 0.0);
        assert_eq!(geo_box.north, 90.0);
        assert_eq!(geo_box.east, 180.0);
    }

    #[test]
    fn test_world_box_altitude() {
        let projection = PlaneProjection::new(1.0);
        let geo_box = GeoBox::new(0.0, 0.0, 10.0, 10.0).with_altitude(100.0, 300.0);
        let world = projection.world_box(&geo_box);

        assert_eq!(world.center.z, 200.0);
        assert_eq!(world.extents.z, 100.0);
        assert_eq!(world.extents.x, 5.0);
        assert_eq!(world.extents.y, 5.0);
    }
}
