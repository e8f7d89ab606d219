//! rigkit-gltf: glTF 2.0 document model and directory interchange for the
//! rigkit DCC tools.
//!
//! The host application walks its own scene graph and hands this crate a
//! flattened [`SceneGraph`]; this crate owns everything from there: the
//! document object model, binary buffer packing, and the on-disk file set
//! (one `.gltf` description plus side-car `.bin` payloads per export
//! directory).
//!
//! # Quick Start
//!
//! ```ignore
//! use rigkit_gltf::{export_scene, import_scene, SceneGraph, SceneNode};
//!
//! let mut scene = SceneGraph::new();
//! scene.add_root(SceneNode::new("root"));
//!
//! // One export = one directory: scene.gltf + out.bin.
//! export_scene(&scene, dir)?;
//!
//! // Round-trip back into the boundary representation.
//! let rebuilt = import_scene(dir)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! SceneGraph ──build──> Document ──serialize──> scene.gltf + *.bin
//! SceneGraph <─rebuild─ Document <─deserialize─ scene.gltf + *.bin
//! ```
//!
//! A single export or import is one synchronous batch pass; buffers are
//! append-only and owned by that pass.

pub mod component;
pub mod document;
pub mod error;
pub mod export;
pub mod import;
pub mod pack;
pub mod reader;
pub mod scene;
pub mod writer;

pub use document::{
    Accessor, Asset, Buffer, BufferView, Document, Mesh, Node, Primitive, Scene,
    ValidationWarning, IDENTITY_MATRIX,
};
pub use error::{GltfError, Result};
pub use export::build_document;
pub use import::rebuild_scene;
pub use pack::append_payload;
pub use reader::{deserialize, import_dir};
pub use scene::{MeshData, SceneGraph, SceneNode};
pub use writer::{export_dir, serialize};

use std::path::{Path, PathBuf};

/// Export a scene graph into one directory.
///
/// Builds the document, serializes it, and persists the file set.
/// Returns the description path.
pub fn export_scene(scene: &SceneGraph, dir: &Path) -> Result<PathBuf> {
    let document = build_document(scene)?;
    export_dir(&document, dir)
}

/// Import one export directory and rebuild the scene graph.
pub fn import_scene(dir: &Path) -> Result<SceneGraph> {
    let document = import_dir(dir)?;
    rebuild_scene(&document)
}
