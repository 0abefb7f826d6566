//! Geographic bounding box
//!
//! An axis-aligned box in geographic coordinates (degrees) with altitude
//! extremes in meters. The box may cross the antimeridian, in which case
//! `east < west` and the longitude span wraps around.

use serde::{Deserialize, Serialize};

/// Geographic bounding box in degrees with altitude bounds in meters.
///
/// Latitudes are in `[-90, 90]`, longitudes in `[-180, 180]`. A box that
/// crosses the antimeridian has `east < west`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    /// Southern latitude bound in degrees
    pub south: f64,

    /// Western longitude bound in degrees
    pub west: f64,

    /// Northern latitude bound in degrees
    pub north: f64,

    /// Eastern longitude bound in degrees
    pub east: f64,

    /// Minimum altitude in meters
    pub min_altitude: f64,

    /// Maximum altitude in meters
    pub max_altitude: f64,
}

impl GeoBox {
    /// Create a new geographic box with zero altitude extremes
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
            min_altitude: 0.0,
            max_altitude: 0.0,
        }
    }

    /// Set the altitude extremes, builder style
    pub fn with_altitude(mut self, min_altitude: f64, max_altitude: f64) -> Self {
        self.min_altitude = min_altitude;
        self.max_altitude = max_altitude;
        self
    }

    /// Rewrite the altitude extremes in place
    pub fn set_altitude(&mut self, min_altitude: f64, max_altitude: f64) {
        self.min_altitude = min_altitude;
        self.max_altitude = max_altitude;
    }

    /// Latitude span in degrees
    pub fn latitude_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees, wrap-aware
    ///
    /// For boxes crossing the antimeridian (`east < west`) the span wraps
    /// around the 180° meridian.
    pub fn longitude_span(&self) -> f64 {
        let span = self.east - self.west;
        if span < 0.0 {
            span + 360.0
        } else {
            span
        }
    }

    /// Altitude span in meters
    pub fn altitude_span(&self) -> f64 {
        self.max_altitude - self.min_altitude
    }

    /// Center of the box as `(latitude, longitude)` degrees, wrap-aware
    pub fn center(&self) -> (f64, f64) {
        let latitude = self.south + self.latitude_span() * 0.5;
        let mut longitude = self.west + self.longitude_span() * 0.5;
        if longitude > 180.0 {
            longitude -= 360.0;
        }
        (latitude, longitude)
    }

    /// Check whether a coordinate lies inside the box, wrap-aware
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        if latitude < self.south || latitude > self.north {
            return false;
        }
        if self.east >= self.west {
            longitude >= self.west && longitude <= self.east
        } else {
            longitude >= self.west || longitude <= self.east
        }
    }
}
