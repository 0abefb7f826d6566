//! Atlas Viewer Render Model Library
//!
//! Renderable objects and the resources they reference: geometry buffers,
//! materials, textures, text labels, and the decoded tile payload contract
//! produced by the decode pipeline and consumed by the tile system.

pub mod decoded;
pub mod object;
pub mod resources;
pub mod text;

// Re-export public API
pub use decoded::DecodedTile;
pub use object::RenderObject;
pub use resources::{Geometry, Material, ResourceId, Texture};
pub use text::{PathBlockingElement, TextElement, TextPathGeometry, TextStyle, TextStyleCache};
