//! Renderable object tree
//!
//! A `RenderObject` is one node of a tile's renderable set: an optional
//! geometry, the materials used to draw it, and child nodes. Disposal policy
//! is carried per object so specialized tiles can opt individual nodes out of
//! geometry or material release when another owner will free them.

use crate::resources::{Geometry, Material};
use std::sync::Arc;

/// One node in a tile's renderable set.
#[derive(Debug, Default)]
pub struct RenderObject {
    /// Debug name
    pub name: String,

    /// Geometry drawn by this node, if any
    pub geometry: Option<Arc<Geometry>>,

    /// Materials used by this node
    pub materials: Vec<Arc<Material>>,

    /// Child nodes, drawn with this node
    pub children: Vec<RenderObject>,

    /// Whether this node passed the last visibility evaluation
    pub visible: bool,

    /// Whether the owning tile may release this node's geometry on clear
    pub geometry_disposable: bool,

    /// Whether the owning tile may release this node's materials on clear
    pub material_disposable: bool,
}

impl RenderObject {
    /// Create a named, visible node with default disposal policy
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            materials: Vec::new(),
            children: Vec::new(),
            visible: true,
            geometry_disposable: true,
            material_disposable: true,
        }
    }

    /// Attach a geometry, builder style
    pub fn with_geometry(mut self, geometry: Arc<Geometry>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Attach a material, builder style
    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.materials.push(material);
        self
    }

    /// Attach a child node, builder style
    pub fn with_child(mut self, child: RenderObject) -> Self {
        self.children.push(child);
        self
    }

    /// Opt this node out of geometry release
    pub fn keep_geometry(mut self) -> Self {
        self.geometry_disposable = false;
        self
    }

    /// Opt this node out of material release
    pub fn keep_materials(mut self) -> Self {
        self.material_disposable = false;
        self
    }

    /// Visit this node and all descendants, depth first
    pub fn for_each(&self, f: &mut impl FnMut(&RenderObject)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    /// Number of nodes in this subtree, including this node
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.for_each(&mut |_| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let object = RenderObject::new("roads");
        assert!(object.visible);
        assert!(object.geometry_disposable);
        assert!(object.material_disposable);
        assert!(object.geometry.is_none());
    }

    #[test]
    fn test_for_each_visits_descendants() {
        let tree = RenderObject::new("root")
            .with_child(RenderObject::new("a").with_child(RenderObject::new("a1")))
            .with_child(RenderObject::new("b"));

        let mut names = Vec::new();
        tree.for_each(&mut |node| names.push(node.name.clone()));
        assert_eq!(names, ["root", "a", "a1", "b"]);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_keep_policy() {
        let object = RenderObject::new("shared").keep_geometry().keep_materials();
        assert!(!object.geometry_disposable);
        assert!(!object.material_disposable);
    }
}
