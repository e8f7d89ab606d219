//! Host-neutral scene graph exchanged with the DCC adapter.
//!
//! The host application's traversal and geometry extraction live outside
//! this crate; what crosses the boundary is this flattened forest of
//! named transforms with optional triangulated mesh data.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// A flattened transform hierarchy plus its traversal roots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraph {
    /// All nodes, in creation order. Child references are indices into
    /// this sequence.
    pub nodes: Vec<SceneNode>,
    /// Indices of the root nodes.
    pub roots: Vec<usize>,
}

impl SceneGraph {
    /// Create an empty scene graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node and return its index.
    pub fn add_root(&mut self, node: SceneNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.roots.push(index);
        index
    }

    /// Add a child node to a parent and return its index.
    pub fn add_child(&mut self, parent: usize, node: SceneNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        if parent < index {
            self.nodes[parent].children.push(index);
        }
        index
    }
}

/// One transform in the host hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Node name.
    pub name: String,
    /// Local transform.
    pub transform: Mat4,
    /// Child node indices.
    pub children: Vec<usize>,
    /// Triangulated mesh data, if the node carries a shape.
    pub mesh: Option<MeshData>,
}

impl SceneNode {
    /// Create a named node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            ..Default::default()
        }
    }

    /// Set the local transform.
    pub fn transformed(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Attach mesh data.
    pub fn with_mesh(mut self, mesh: MeshData) -> Self {
        self.mesh = Some(mesh);
        self
    }
}

/// Triangulated geometry supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle indices, three per face.
    pub indices: Vec<u32>,
}
