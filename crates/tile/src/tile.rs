//! Tile lifecycle and bookkeeping
//!
//! A `Tile` owns the per-tile state the map view juggles every frame: world
//! and geographic bounds that track terrain elevation, recency bookkeeping
//! read by the cache manager, the copy-on-write label store, cached resource
//! accounting, and the disposal protocol that separates tile-owned resources
//! from resources shared across tiles.
//!
//! Bounds precedence: explicit bounds supplied by a decoded payload are
//! authoritative and are never overwritten by elevation updates. Without
//! explicit bounds the world box is derived from the geographic box, whose
//! altitude extremes combine terrain elevation and the tallest geometry of
//! the decoded payload.

use crate::loader::{LoaderError, TileLoader};
use crate::resource_info::{estimate_tile_resources, EstimationConfig, TileResourceInfo};
use crate::text_elements::{TextElementGroups, TileTextElements};
use atlas_geo::{ElevationRange, GeoBox, OrientedBox, Projection, TileKey};
use atlas_render::{
    DecodedTile, PathBlockingElement, RenderObject, ResourceId, TextElement, TextPathGeometry,
    TextStyleCache,
};
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Render frame counter
pub type FrameNumber = i64;

/// Sentinel for "never seen in any frame"
pub const INVALID_FRAME: FrameNumber = FrameNumber::MIN;

/// Notification emitted by a tile toward the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEvent {
    /// The tile's content changed and the view should schedule a redraw
    UpdateRequested(TileKey),
}

/// Per-frame animation state attached to a tile, released on clear.
pub trait TileAnimationHandler: Send {
    /// Advance the animation for the given frame
    fn update(&mut self, frame: FrameNumber);

    /// Release animation state. Called once, from the owning tile.
    fn dispose(&mut self);
}

/// Incremental geometry creation attached to a tile.
///
/// Some sources build render geometry over several frames after decode; the
/// tile only needs to drive and eventually dispose that process.
pub trait TileGeometryLoader: Send {
    /// Whether all geometry has been created
    fn is_finished(&self) -> bool;

    /// Perform one increment of geometry creation
    fn update(&mut self);

    /// Release loader state. Called once, from the owning tile.
    fn dispose(&mut self);
}

/// Lifecycle and bookkeeping record for one spatial tile of map content.
pub struct Tile {
    key: TileKey,
    offset: i32,
    projection: Arc<dyn Projection>,

    geo_box: GeoBox,
    bounding_box: OrientedBox,
    elevation_range: ElevationRange,
    /// `Some` once a payload without explicit bounds was decoded; gates
    /// world-box recomputation on elevation updates
    max_geometry_height: Option<f64>,
    /// Explicit payload bounds are authoritative while this is set
    explicit_bounds: bool,

    objects: Vec<RenderObject>,
    owned_textures: HashSet<ResourceId>,
    attributions: Vec<String>,
    payload_bytes: Option<usize>,
    forced_has_geometry: Option<bool>,

    last_requested_frame: FrameNumber,
    frame_first_visible: FrameNumber,
    frame_last_visible: FrameNumber,
    frames_visible: u64,
    visibility_epoch: i64,
    visible_area: f64,

    resource_info: Option<TileResourceInfo>,
    estimation: EstimationConfig,

    text_elements: TileTextElements,
    text_style_cache: TextStyleCache,
    blocking_elements: Vec<PathBlockingElement>,
    prepared_text_paths: Option<Vec<TextPathGeometry>>,

    loader: Option<Box<dyn TileLoader>>,
    geometry_loader: Option<Box<dyn TileGeometryLoader>>,
    animation_handler: Option<Box<dyn TileAnimationHandler>>,
    events: Option<Sender<TileEvent>>,

    disposed: bool,
}

impl Tile {
    /// Create a tile for a key, deriving initial bounds from the projection
    pub fn new(key: TileKey, projection: Arc<dyn Projection>) -> Self {
        let geo_box = projection.tile_geo_box(key);
        let bounding_box = projection.world_box(&geo_box);
        Self {
            key,
            offset: 0,
            projection,
            geo_box,
            bounding_box,
            elevation_range: ElevationRange::pending(),
            max_geometry_height: None,
            explicit_bounds: false,
            objects: Vec::new(),
            owned_textures: HashSet::new(),
            attributions: Vec::new(),
            payload_bytes: None,
            forced_has_geometry: None,
            last_requested_frame: INVALID_FRAME,
            frame_first_visible: INVALID_FRAME,
            frame_last_visible: INVALID_FRAME,
            frames_visible: 0,
            visibility_epoch: -1,
            visible_area: 0.0,
            resource_info: None,
            estimation: EstimationConfig::default(),
            text_elements: TileTextElements::new(),
            text_style_cache: TextStyleCache::new(),
            blocking_elements: Vec::new(),
            prepared_text_paths: None,
            loader: None,
            geometry_loader: None,
            animation_handler: None,
            events: None,
            disposed: false,
        }
    }

    /// Set the world wrap-around copy index, builder style
    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Override the resource estimation constants, builder style
    pub fn with_estimation_config(mut self, config: EstimationConfig) -> Self {
        self.estimation = config;
        self
    }

    /// Attach the channel the tile notifies when its content changes
    pub fn set_event_sender(&mut self, events: Sender<TileEvent>) {
        self.events = Some(events);
    }

    /// Tile key
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// World wrap-around copy index
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Geographic bounds with current altitude extremes
    pub fn geo_box(&self) -> &GeoBox {
        &self.geo_box
    }

    /// World-space bounds used for culling and distance tests
    pub fn bounding_box(&self) -> &OrientedBox {
        &self.bounding_box
    }

    /// Current terrain elevation range under this tile
    pub fn elevation_range(&self) -> ElevationRange {
        self.elevation_range
    }

    /// Tallest decoded geometry above terrain, when bounds are derived
    pub fn max_geometry_height(&self) -> Option<f64> {
        self.max_geometry_height
    }

    /// Renderable objects of the decoded payload
    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    /// Attribution identifiers collected from decoded payloads
    pub fn attributions(&self) -> &[String] {
        &self.attributions
    }

    /// Whether `dispose` has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // --- bounds -----------------------------------------------------------

    /// Update the terrain elevation range.
    ///
    /// Equal ranges (including status) are a no-op. The geographic box's
    /// altitude extremes always follow the range; the world box is only
    /// recomputed once a payload without explicit bounds has been decoded,
    /// and never while explicit payload bounds are active.
    pub fn set_elevation_range(&mut self, range: ElevationRange) {
        if range == self.elevation_range {
            return;
        }
        self.elevation_range = range;
        self.elevate_geo_box();
        if self.max_geometry_height.is_some() {
            self.update_bounding_box_from_geo_box();
        }
    }

    fn elevate_geo_box(&mut self) {
        let geometry_height = self.max_geometry_height.unwrap_or(0.0);
        self.geo_box.set_altitude(
            self.elevation_range.min_elevation,
            self.elevation_range.max_elevation + geometry_height,
        );
    }

    fn update_bounding_box_from_geo_box(&mut self) {
        assert!(
            !self.explicit_bounds,
            "derived bounds must not overwrite explicit payload bounds"
        );
        self.bounding_box = self.projection.world_box(&self.geo_box);
    }

    // --- payload ----------------------------------------------------------

    /// Adopt a decoded payload.
    ///
    /// An empty object list is a legitimate "nothing to draw here" outcome
    /// and is recorded as having geometry so the view does not re-request
    /// the tile. Explicit payload bounds become authoritative; otherwise the
    /// payload's maximum geometry height flows into the derived bounds.
    pub fn set_decoded_tile(&mut self, decoded: DecodedTile) {
        let DecodedTile {
            objects,
            bounding_box,
            max_geometry_height,
            attributions,
            payload_bytes,
            decode_duration,
        } = decoded;

        if objects.is_empty() {
            self.forced_has_geometry = Some(true);
        }
        self.objects = objects;
        self.payload_bytes = payload_bytes;
        for attribution in attributions {
            if !self.attributions.contains(&attribution) {
                self.attributions.push(attribution);
            }
        }

        match bounding_box {
            Some(bounds) => {
                self.explicit_bounds = true;
                self.max_geometry_height = None;
                self.bounding_box = bounds;
            }
            None => {
                self.explicit_bounds = false;
                self.max_geometry_height = Some(max_geometry_height.unwrap_or(0.0));
                self.elevate_geo_box();
                self.update_bounding_box_from_geo_box();
            }
        }

        if let Some(duration) = decode_duration {
            log::trace!("tile {:?} decoded in {duration:?}", self.key);
        }
        self.invalidate_resource_info();
        self.notify_update();
    }

    /// Drop the decoded payload reference.
    ///
    /// Bounds stay as last computed and render resources are not released;
    /// call `clear` for the latter.
    pub fn clear_decoded_tile(&mut self) {
        self.payload_bytes = None;
        self.invalidate_resource_info();
    }

    /// Whether the tile has renderable content.
    ///
    /// A forced flag set by `force_has_geometry` (or by an empty decoded
    /// payload) overrides the object list.
    pub fn has_geometry(&self) -> bool {
        self.forced_has_geometry
            .unwrap_or(!self.objects.is_empty())
    }

    /// Override (or with `None`, un-override) `has_geometry`
    pub fn force_has_geometry(&mut self, forced: Option<bool>) {
        self.forced_has_geometry = forced;
    }

    fn notify_update(&self) {
        if let Some(events) = &self.events {
            let _ = events.send(TileEvent::UpdateRequested(self.key));
        }
    }

    // --- visibility bookkeeping -------------------------------------------

    /// Record that frustum culling requested this tile for a frame
    pub fn mark_requested(&mut self, frame: FrameNumber) {
        if self.disposed {
            return;
        }
        self.last_requested_frame = self.last_requested_frame.max(frame);
    }

    /// Whether the tile counts as visible at `current_frame`.
    ///
    /// A tile requested at frame N stays visible through frame N+1, one
    /// frame of grace so culling jitter does not thrash the cache.
    pub fn is_visible(&self, current_frame: FrameNumber) -> bool {
        self.last_requested_frame >= current_frame.saturating_sub(1)
    }

    /// Record that the tile is about to be drawn this frame.
    ///
    /// Returns `false` for disposed tiles, which must not be drawn.
    pub fn will_render(&mut self, frame: FrameNumber) -> bool {
        if self.disposed {
            return false;
        }
        if self.frame_first_visible == INVALID_FRAME {
            self.frame_first_visible = frame;
        }
        self.frame_last_visible = frame;
        self.frames_visible += 1;
        true
    }

    /// Record that the frame's draw (and label consumption) finished
    pub fn did_render(&mut self) {
        self.text_elements.mark_consumed();
    }

    /// First frame the tile was drawn, or `INVALID_FRAME`
    pub fn frame_first_visible(&self) -> FrameNumber {
        self.frame_first_visible
    }

    /// Most recent frame the tile was drawn, or `INVALID_FRAME`
    pub fn frame_last_visible(&self) -> FrameNumber {
        self.frame_last_visible
    }

    /// Number of frames the tile has been drawn
    pub fn frames_visible(&self) -> u64 {
        self.frames_visible
    }

    /// Estimated visible screen area, used as load priority
    pub fn visible_area(&self) -> f64 {
        self.visible_area
    }

    /// Update the estimated visible screen area.
    ///
    /// Forwards the new value to an in-flight loader as a priority hint;
    /// unchanged values are not forwarded.
    pub fn set_visible_area(&mut self, area: f64) {
        if area == self.visible_area {
            return;
        }
        self.visible_area = area;
        if let Some(loader) = &mut self.loader {
            loader.update_priority(area);
        }
    }

    /// Stamp the tile as evaluated in a visibility pass
    pub fn stamp_visibility_epoch(&mut self, epoch: i64) {
        self.visibility_epoch = epoch;
    }

    /// Whether the tile was not yet evaluated in the given visibility pass
    pub fn needs_visibility_update(&self, epoch: i64) -> bool {
        self.visibility_epoch != epoch
    }

    /// Forget the visibility pass stamp
    pub fn reset_visibility_counter(&mut self) {
        self.visibility_epoch = -1;
    }

    // --- labels -----------------------------------------------------------

    /// Current label store
    pub fn text_elements(&self) -> &TileTextElements {
        &self.text_elements
    }

    /// Current label snapshot, as handed to the text renderer
    pub fn text_element_groups(&self) -> Arc<TextElementGroups> {
        self.text_elements.snapshot()
    }

    /// Add a label to the group matching its priority
    pub fn add_text_element(&mut self, element: Arc<TextElement>) {
        self.text_elements.add(element);
        self.invalidate_resource_info();
    }

    /// Remove a label; `false` if it was not in the store
    pub fn remove_text_element(&mut self, element: &Arc<TextElement>) -> bool {
        let removed = self.text_elements.remove(element);
        if removed {
            self.invalidate_resource_info();
        }
        removed
    }

    /// Remove all labels
    pub fn clear_text_elements(&mut self) {
        self.text_elements.clear();
        self.invalidate_resource_info();
    }

    /// Add a path that blocks label placement
    pub fn add_blocking_element(&mut self, element: PathBlockingElement) {
        self.blocking_elements.push(element);
    }

    /// Paths blocking label placement in this tile
    pub fn blocking_elements(&self) -> &[PathBlockingElement] {
        &self.blocking_elements
    }

    /// Cache path geometry prepared for along-path text rendering
    pub fn set_prepared_text_paths(&mut self, paths: Vec<TextPathGeometry>) {
        self.prepared_text_paths = Some(paths);
    }

    /// Prepared path geometry, if any was cached since the last clear
    pub fn prepared_text_paths(&self) -> Option<&[TextPathGeometry]> {
        self.prepared_text_paths.as_deref()
    }

    /// Per-tile label style cache
    pub fn text_style_cache_mut(&mut self) -> &mut TextStyleCache {
        &mut self.text_style_cache
    }

    // --- resource accounting ----------------------------------------------

    /// Register a texture as owned by this tile.
    ///
    /// Only owned textures are released on clear; unregistered textures are
    /// treated as shared (e.g. a glyph atlas) and left alone.
    pub fn add_owned_texture(&mut self, id: ResourceId) {
        self.owned_textures.insert(id);
    }

    /// Whether this tile owns the given texture
    pub fn owns_texture(&self, id: ResourceId) -> bool {
        self.owned_textures.contains(&id)
    }

    /// Current resource estimate, computed on demand and cached until the
    /// next structural mutation
    pub fn get_resource_info(&mut self) -> TileResourceInfo {
        if let Some(info) = self.resource_info {
            return info;
        }
        let info = estimate_tile_resources(
            &self.objects,
            self.text_elements.groups(),
            self.payload_bytes,
            &self.estimation,
        );
        self.resource_info = Some(info);
        info
    }

    /// Combined heap and GPU estimate in bytes
    pub fn memory_usage(&mut self) -> usize {
        self.get_resource_info().memory_usage()
    }

    /// Drop the cached resource estimate
    pub fn invalidate_resource_info(&mut self) {
        self.resource_info = None;
    }

    // --- loading ----------------------------------------------------------

    /// Attach and start a loader. An already attached loader is canceled
    /// first. No-op on disposed tiles.
    pub fn load(&mut self, mut loader: Box<dyn TileLoader>) {
        if self.disposed {
            return;
        }
        if let Some(mut previous) = self.loader.take() {
            previous.cancel();
        }
        loader.start();
        self.loader = Some(loader);
    }

    /// Loader currently attached, if any
    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Poll the attached loader once, at a frame boundary.
    ///
    /// Returns `true` when a payload was adopted this call. Cancellation and
    /// load failure are ordinary outcomes and simply detach the loader; a
    /// misbehaving loader is logged.
    pub fn poll_loader(&mut self) -> bool {
        let Some(loader) = &mut self.loader else {
            return false;
        };
        let Some(result) = loader.poll() else {
            return false;
        };
        self.loader = None;
        match result {
            Ok(decoded) => {
                self.set_decoded_tile(decoded);
                true
            }
            Err(LoaderError::Canceled) => {
                log::debug!("tile {:?} load canceled", self.key);
                false
            }
            Err(LoaderError::Failed(reason)) => {
                log::debug!("tile {:?} load failed: {reason}", self.key);
                false
            }
            Err(error) => {
                log::warn!("tile {:?} loader misbehaved: {error}", self.key);
                false
            }
        }
    }

    /// Attach an incremental geometry loader, disposed with the tile
    pub fn set_geometry_loader(&mut self, loader: Box<dyn TileGeometryLoader>) {
        self.geometry_loader = Some(loader);
    }

    /// Attach an animation handler, released on clear
    pub fn set_animation_handler(&mut self, handler: Box<dyn TileAnimationHandler>) {
        self.animation_handler = Some(handler);
    }

    // --- disposal ---------------------------------------------------------

    /// Release all render resources owned by this tile.
    ///
    /// Geometry and materials are released per the objects' disposal policy.
    /// Textures are released only if registered via `add_owned_texture`;
    /// everything else is assumed shared. The tile itself stays usable and
    /// may adopt a new payload afterwards.
    pub fn clear(&mut self) {
        let objects = std::mem::take(&mut self.objects);
        for object in &objects {
            object.for_each(&mut |node| {
                if node.geometry_disposable {
                    if let Some(geometry) = &node.geometry {
                        geometry.dispose();
                    }
                }
                if node.material_disposable {
                    for material in &node.materials {
                        for texture in material.textures() {
                            if self.owned_textures.contains(&texture.id()) {
                                texture.dispose();
                            }
                        }
                        material.dispose();
                    }
                }
            });
        }
        self.owned_textures.clear();
        self.prepared_text_paths = None;
        if let Some(mut handler) = self.animation_handler.take() {
            handler.dispose();
        }
        self.text_style_cache.clear();
        self.text_elements.clear();
        self.blocking_elements.clear();
        self.invalidate_resource_info();
    }

    /// Tear the tile down. Idempotent.
    ///
    /// Cancels any in-flight load, releases resources via `clear`, and makes
    /// the tile permanently invisible to the cache manager.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(mut loader) = self.loader.take() {
            loader.cancel();
        }
        if let Some(mut geometry_loader) = self.geometry_loader.take() {
            geometry_loader.dispose();
        }
        self.clear();
        self.payload_bytes = None;
        self.explicit_bounds = false;
        self.max_geometry_height = None;
        self.last_requested_frame = INVALID_FRAME;
        self.disposed = true;
        log::trace!("tile {:?} disposed", self.key);
    }
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("key", &self.key)
            .field("offset", &self.offset)
            .field("objects", &self.objects.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}
