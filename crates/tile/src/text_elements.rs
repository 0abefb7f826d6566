//! Copy-on-write label store
//!
//! Labels are grouped by placement priority. The text renderer consumes the
//! whole store by reference once per frame and may keep that reference
//! across the frame boundary as its diff baseline, so mutating the live
//! store in place would corrupt the renderer's diff. Instead, the first
//! mutation after the renderer marks the store consumed swaps in a
//! structural clone; the renderer's old snapshot stays valid and unchanged.
//! Labels themselves are immutable once grouped and are shared between
//! snapshots.

use atlas_render::TextElement;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Labels sharing one placement priority.
#[derive(Debug, Clone, Default)]
pub struct TextElementGroup {
    priority: i32,
    elements: Vec<Arc<TextElement>>,
}

impl TextElementGroup {
    /// Create an empty group for a priority
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            elements: Vec::new(),
        }
    }

    /// The group's placement priority
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Labels in this group
    pub fn elements(&self) -> &[Arc<TextElement>] {
        &self.elements
    }

    /// Number of labels in this group
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the group has no labels
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn contains(&self, element: &Arc<TextElement>) -> bool {
        self.elements.iter().any(|e| Arc::ptr_eq(e, element))
    }

    fn push(&mut self, element: Arc<TextElement>) {
        self.elements.push(element);
    }

    fn remove(&mut self, element: &Arc<TextElement>) -> bool {
        if let Some(index) = self.elements.iter().position(|e| Arc::ptr_eq(e, element)) {
            self.elements.remove(index);
            true
        } else {
            false
        }
    }
}

/// All label groups of a tile, keyed by priority.
///
/// Cloning produces independent group objects that reference the same label
/// instances.
#[derive(Debug, Clone, Default)]
pub struct TextElementGroups {
    groups: BTreeMap<i32, TextElementGroup>,
}

impl TextElementGroups {
    /// Group for a priority, if present
    pub fn get(&self, priority: i32) -> Option<&TextElementGroup> {
        self.groups.get(&priority)
    }

    /// Iterate over groups in ascending priority order
    pub fn iter(&self) -> impl Iterator<Item = &TextElementGroup> {
        self.groups.values()
    }

    /// Total number of labels across all groups
    pub fn element_count(&self) -> usize {
        self.groups.values().map(TextElementGroup::len).sum()
    }

    /// Whether no group contains any label
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(TextElementGroup::is_empty)
    }

    fn group_mut(&mut self, priority: i32) -> &mut TextElementGroup {
        self.groups
            .entry(priority)
            .or_insert_with(|| TextElementGroup::new(priority))
    }

    fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Change-tracked, copy-on-write label store of one tile.
///
/// The `changed` flag means "mutated since the renderer last consumed the
/// store". While it is `false`, the live snapshot may still be referenced by
/// the renderer, so the first mutation clones the structure before touching
/// it. Subsequent mutations before the next consume edit the fresh snapshot
/// in place.
#[derive(Debug, Default)]
pub struct TileTextElements {
    groups: Arc<TextElementGroups>,
    changed: bool,
}

impl TileTextElements {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the live groups for inspection
    pub fn groups(&self) -> &TextElementGroups {
        &self.groups
    }

    /// Snapshot handed to the text renderer, retained across frames.
    ///
    /// Once the renderer resets the change flag the snapshot is never
    /// mutated again; the next mutation swaps the live store instead. As
    /// long as no snapshot is taken mid-window, mutations between two
    /// consumes edit one uniquely owned store in place.
    pub fn snapshot(&self) -> Arc<TextElementGroups> {
        Arc::clone(&self.groups)
    }

    /// Whether the store was mutated since the last `mark_consumed`
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Reset the change flag after the renderer consumed the store
    pub fn mark_consumed(&mut self) {
        self.changed = false;
    }

    /// Insert a label into the group matching its priority.
    pub fn add(&mut self, element: Arc<TextElement>) {
        self.pre_mutate();
        let priority = element.priority();
        Arc::make_mut(&mut self.groups).group_mut(priority).push(element);
    }

    /// Remove a label from the group matching its current priority field.
    ///
    /// Returns `false` if no group exists for that priority or the label is
    /// not in it, which also covers a label whose priority field no longer
    /// matches the group it was inserted under.
    pub fn remove(&mut self, element: &Arc<TextElement>) -> bool {
        let priority = element.priority();
        match self.groups.get(priority) {
            Some(group) if group.contains(element) => {}
            _ => return false,
        }
        self.pre_mutate();
        Arc::make_mut(&mut self.groups).group_mut(priority).remove(element)
    }

    /// Remove all labels. No-op (and no clone) if already empty.
    pub fn clear(&mut self) {
        if self.groups.is_empty() {
            return;
        }
        self.pre_mutate();
        Arc::make_mut(&mut self.groups).clear();
    }

    /// Clone-before-mutate: the first mutation after a consume swaps in a
    /// fresh structure so any outstanding reader snapshot stays intact.
    fn pre_mutate(&mut self) {
        if !self.changed {
            self.groups = Arc::new((*self.groups).clone());
            self.changed = true;
        }
    }
}
