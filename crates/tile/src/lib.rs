//! Atlas Viewer Tile Library
//!
//! The lifecycle and bookkeeping object for one spatial tile of loaded map
//! content: world/geographic bounds that track terrain elevation, recency
//! bookkeeping read by the cache manager, a copy-on-write label store
//! consumed by the text renderer, resource accounting for memory budgets,
//! and the disposal protocol that separates tile-owned resources from
//! resources shared across tiles.

pub mod loader;
pub mod resource_info;
pub mod text_elements;
pub mod tile;

// Re-export public API
pub use loader::{
    CancellationToken, ChannelTileLoader, LoaderError, LoaderProgress, LoaderState, TileLoader,
};
pub use resource_info::{EstimationConfig, TileResourceInfo};
pub use text_elements::{TextElementGroup, TextElementGroups, TileTextElements};
pub use tile::{
    Tile, TileAnimationHandler, TileEvent, TileGeometryLoader, FrameNumber, INVALID_FRAME,
};
