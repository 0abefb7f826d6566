//! Text labels and label placement helpers
//!
//! `TextElement` is a prioritized map label. Elements are treated as
//! immutable once placed into a priority group, which is what allows the
//! tile's label store to share them between snapshots.

use glam::DVec3;
use std::collections::HashMap;

/// A prioritized text label.
///
/// Immutable after construction; stored behind `Arc` in label groups.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    text: String,
    priority: i32,
    may_overlap: bool,
}

impl TextElement {
    /// Create a new label with the given placement priority
    pub fn new(text: impl Into<String>, priority: i32) -> Self {
        Self {
            text: text.into(),
            priority,
            may_overlap: false,
        }
    }

    /// Allow the label to overlap other labels, builder style
    pub fn with_overlap(mut self) -> Self {
        self.may_overlap = true;
        self
    }

    /// Label text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placement priority; higher values are placed first
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the label may overlap other labels
    pub fn may_overlap(&self) -> bool {
        self.may_overlap
    }
}

/// A world-space path that blocks label placement (e.g. a road a street name
/// is drawn along, which other labels must not cover).
#[derive(Debug, Clone, PartialEq)]
pub struct PathBlockingElement {
    points: Vec<DVec3>,
}

impl PathBlockingElement {
    /// Create a blocking path from world-space points
    pub fn new(points: Vec<DVec3>) -> Self {
        Self { points }
    }

    /// Path points in world space
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }
}

/// Path geometry prepared for along-path text rendering, cached per tile
/// between frames and released when the tile is cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPathGeometry {
    /// Sampled path points in world space
    pub points: Vec<DVec3>,

    /// Accumulated path length in world units
    pub length: f64,
}

/// A resolved label style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph size in points
    pub size: f32,

    /// RGBA color
    pub color: [f32; 4],
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 16.0,
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Cache of resolved label styles, keyed by style name.
///
/// Style resolution is cheap but repeated for every label every time the
/// theme changes; tiles keep one cache and drop it wholesale on clear.
#[derive(Debug, Default)]
pub struct TextStyleCache {
    styles: HashMap<String, TextStyle>,
}

impl TextStyleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a style, resolving and caching it on first use
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        resolve: impl FnOnce() -> TextStyle,
    ) -> TextStyle {
        if let Some(style) = self.styles.get(name) {
            return *style;
        }
        let style = resolve();
        self.styles.insert(name.to_string(), style);
        style
    }

    /// Number of cached styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Drop all cached styles
    pub fn clear(&mut self) {
        self.styles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_element() {
        let element = TextElement::new("Main St", 3).with_overlap();
        assert_eq!(element.text(), "Main St");
        assert_eq!(element.priority(), 3);
        assert!(element.may_overlap());
    }

    #[test]
    fn test_style_cache_resolves_once() {
        let mut cache = TextStyleCache::new();
        let mut resolutions = 0;

        for _ in 0..3 {
            let style = cache.get_or_insert_with("roads", || {
                resolutions += 1;
                TextStyle {
                    size: 12.0,
                    ..TextStyle::default()
                }
            });
            assert_eq!(style.size, 12.0);
        }

        assert_eq!(resolutions, 1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
