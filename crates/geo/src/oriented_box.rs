//! World-space oriented bounding box

use glam::DVec3;

/// Oriented bounding box in world space.
///
/// Defined by a center, three orthonormal axes and half-extents along each
/// axis. For planar projections the axes stay world-aligned; curved
/// projections tilt them per tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Center position in world units
    pub center: DVec3,

    /// Local X axis (unit length)
    pub x_axis: DVec3,

    /// Local Y axis (unit length)
    pub y_axis: DVec3,

    /// Local Z axis (unit length)
    pub z_axis: DVec3,

    /// Half-extents along each local axis
    pub extents: DVec3,
}

impl OrientedBox {
    /// Create a new oriented box from a center, axes and half-extents
    pub fn new(center: DVec3, x_axis: DVec3, y_axis: DVec3, z_axis: DVec3, extents: DVec3) -> Self {
        Self {
            center,
            x_axis,
            y_axis,
            z_axis,
            extents,
        }
    }

    /// Create an axis-aligned box from a center and half-extents
    pub fn axis_aligned(center: DVec3, extents: DVec3) -> Self {
        Self::new(center, DVec3::X, DVec3::Y, DVec3::Z, extents)
    }

    /// Check whether a world-space point lies inside the box
    pub fn contains_point(&self, point: DVec3) -> bool {
        let offset = point - self.center;
        offset.dot(self.x_axis).abs() <= self.extents.x
            && offset.dot(self.y_axis).abs() <= self.extents.y
            && offset.dot(self.z_axis).abs() <= self.extents.z
    }

    /// Return a copy grown by `margin` world units along every axis
    pub fn expanded_by(&self, margin: f64) -> Self {
        Self {
            extents: self.extents + DVec3::splat(margin),
            ..*self
        }
    }

    /// The largest half-extent, useful as a coarse bounding-sphere radius
    pub fn max_extent(&self) -> f64 {
        self.extents.x.max(self.extents.y).max(self.extents.z)
    }
}

impl Default for OrientedBox {
    fn default() -> Self {
        Self::axis_aligned(DVec3::ZERO, DVec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point_axis_aligned() {
        let obb = OrientedBox::axis_aligned(DVec3::new(10.0, 0.0, 0.0), DVec3::new(5.0, 5.0, 5.0));
        assert!(obb.contains_point(DVec3::new(12.0, 3.0, -4.0)));
        assert!(!obb.contains_point(DVec3::new(16.0, 0.0, 0.0)));
    }

    #[test]
    fn test_contains_point_rotated() {
        // Box rotated 45 degrees around Z
        let inv_sqrt2 = 1.0 / 2.0_f64.sqrt();
        let obb = OrientedBox::new(
            DVec3::ZERO,
            DVec3::new(inv_sqrt2, inv_sqrt2, 0.0),
            DVec3::new(-inv_sqrt2, inv_sqrt2, 0.0),
            DVec3::Z,
            DVec3::new(1.0, 1.0, 1.0),
        );
        // The rotated X face passes through world (sqrt2/2, sqrt2/2, 0)
        assert!(obb.contains_point(DVec3::new(0.69, 0.69, 0.0)));
        // World (1.1, -1.1, 0) projects past the rotated Y face
        assert!(!obb.contains_point(DVec3::new(1.1, -1.1, 0.0)));
    }

    #[test]
    fn test_expanded_by() {
        let obb = OrientedBox::axis_aligned(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0));
        let grown = obb.expanded_by(1.0);
        assert_eq!(grown.extents, DVec3::new(2.0, 3.0, 4.0));
        assert_eq!(grown.center, obb.center);
        assert_eq!(grown.max_extent(), 4.0);
    }
}
