//! Atlas Viewer Geometry Library
//!
//! Geographic and world-space geometry types shared by the tile system:
//! geographic bounding boxes, elevation ranges, oriented bounding boxes,
//! tile keys, and the projection contract that maps between them.

pub mod elevation;
pub mod geo_box;
pub mod oriented_box;
pub mod projection;
pub mod tile_key;

// Re-export public API
pub use elevation::{ElevationRange, ElevationStatus};
pub use geo_box::GeoBox;
pub use oriented_box::OrientedBox;
pub use projection::{PlaneProjection, Projection};
pub use tile_key::TileKey;
