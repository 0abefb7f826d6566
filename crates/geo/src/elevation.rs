//! Elevation range with calculation status
//!
//! Tracks the vertical extent of terrain under a tile together with a tag
//! describing how the extent was obtained. Equality over all three fields is
//! the no-op guard used before triggering bound recomputation.

use serde::{Deserialize, Serialize};

/// How an elevation range was calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElevationStatus {
    /// No elevation data has been sampled yet
    Pending,

    /// Sampled from a coarser level of detail; may be refined later
    Approximate,

    /// Sampled at the tile's own level of detail
    Final,
}

/// Minimum and maximum terrain elevation under a tile, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    /// Minimum elevation in meters
    pub min_elevation: f64,

    /// Maximum elevation in meters
    pub max_elevation: f64,

    /// How this range was calculated
    pub status: ElevationStatus,
}

impl ElevationRange {
    /// Create a new elevation range
    pub fn new(min_elevation: f64, max_elevation: f64, status: ElevationStatus) -> Self {
        Self {
            min_elevation,
            max_elevation,
            status,
        }
    }

    /// A zero range that has not been calculated yet
    pub fn pending() -> Self {
        Self::new(0.0, 0.0, ElevationStatus::Pending)
    }

    /// Elevation span in meters
    pub fn span(&self) -> f64 {
        self.max_elevation - self.min_elevation
    }
}

impl Default for ElevationRange {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_over_all_fields() {
        let a = ElevationRange::new(0.0, 100.0, ElevationStatus::Approximate);
        let b = ElevationRange::new(0.0, 100.0, ElevationStatus::Approximate);
        let c = ElevationRange::new(0.0, 100.0, ElevationStatus::Final);
        let d = ElevationRange::new(0.0, 200.0, ElevationStatus::Approximate);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_pending_default() {
        let range = ElevationRange::default();
        assert_eq!(range.status, ElevationStatus::Pending);
        assert_eq!(range.span(), 0.0);
    }
}
