//! glTF 2.0 document object model.
//!
//! Every cross-reference between entities is a plain index into the owning
//! sequence on [`Document`]; the serialized form is index-based, so the
//! in-memory model is too. Fields are emitted only when present, in the
//! declared struct order, which keeps output byte-reproducible for
//! identical input.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::component::MODE_TRIANGLES;
use crate::error::{GltfError, Result};

/// Column-major identity transform. Treated as the absent matrix value:
/// a node carrying it serializes with no `matrix` key at all.
pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Root document aggregate.
///
/// Owns every entity sequence; declaration order is the index space that
/// all cross-references point into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document metadata.
    #[serde(default)]
    pub asset: Asset,
    /// Default scene index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    /// Scenes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Scene>,
    /// Nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    /// Meshes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Mesh>,
    /// Accessors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    /// Buffer views.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    /// Buffers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
}

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Copyright notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Software that produced the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Format version. Required; defaults to "2.0" at emission when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Minimum format version required to load the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
}

/// One traversal root-set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Root node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    /// Scene name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One transform in the hierarchy.
///
/// The hierarchy is a forest: children are indices, and no node may be
/// its own ancestor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Child node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    /// Local transform, column-major. The identity matrix is never
    /// emitted; an absent matrix means identity.
    #[serde(default, skip_serializing_if = "matrix_is_identity")]
    pub matrix: Option<[f32; 16]>,
    /// Mesh index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
}

fn matrix_is_identity(matrix: &Option<[f32; 16]>) -> bool {
    match matrix {
        None => true,
        Some(m) => *m == IDENTITY_MATRIX,
    }
}

/// A collection of primitives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Mesh primitives. Required, non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primitives: Vec<Primitive>,
    /// Morph target weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,
    /// Mesh name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One drawable unit of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Semantic attribute name (e.g. "POSITION") to accessor index.
    /// Required, non-empty. Insertion order is preserved on the wire.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, usize>,
    /// Index accessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    /// Material index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    /// Render mode.
    #[serde(default = "default_primitive_mode")]
    pub mode: u32,
}

fn default_primitive_mode() -> u32 {
    MODE_TRIANGLES
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            attributes: IndexMap::new(),
            indices: None,
            material: None,
            mode: MODE_TRIANGLES,
        }
    }
}

/// A typed view over a byte range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    /// Owning buffer view index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Byte offset within the buffer view.
    #[serde(default)]
    pub byte_offset: usize,
    /// Component type code. Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<u32>,
    /// Whether integer values are normalized to [0, 1] / [-1, 1].
    #[serde(default)]
    pub normalized: bool,
    /// Element count. Required, >= 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Element shape tag ("SCALAR", "VEC3", ...). Required.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    /// Per-component maximum bounds; length matches the element shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
    /// Per-component minimum bounds; length matches the element shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    /// Accessor name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A contiguous byte sub-range of one buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    /// Owning buffer index.
    #[serde(default)]
    pub buffer: usize,
    /// Byte offset into the buffer.
    #[serde(default)]
    pub byte_offset: usize,
    /// Byte length. Required, >= 1. Excludes alignment padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_length: Option<usize>,
    /// Stride between elements, 4..=252.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    /// Usage target tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Buffer view name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A byte accumulator plus its external-file reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    /// External payload filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Payload byte length. Recomputed from the live payload at emission,
    /// never trusted as stored state.
    #[serde(default)]
    pub byte_length: usize,
    /// Buffer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Accumulated payload bytes. Persisted as a side-car file, not in
    /// the description.
    #[serde(skip)]
    pub data: Vec<u8>,
    /// This buffer's position in the document's buffer sequence.
    #[serde(skip)]
    pub index: usize,
}

/// The default external filename for a uri-less buffer.
pub(crate) fn default_buffer_uri(index: usize) -> String {
    if index == 0 {
        "out.bin".to_string()
    } else {
        format!("out_{}.bin", index)
    }
}

/// A required field that was absent at emission time.
///
/// Warnings are logged and the document is emitted anyway; downstream
/// consumers may tolerate a partial document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Entity kind ("Asset", "Mesh", ...).
    pub entity: &'static str,
    /// Index of the entity in its owning sequence.
    pub index: usize,
    /// Name of the absent field, as spelled on the wire.
    pub field: &'static str,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "required field missing for glTF {} {}: {}",
            self.entity, self.index, self.field
        )
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene and return its index.
    pub fn add_scene(&mut self, scene: Scene) -> usize {
        let index = self.scenes.len();
        self.scenes.push(scene);
        index
    }

    /// Add a node and return its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        index
    }

    /// Add a mesh and return its index.
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        let index = self.meshes.len();
        self.meshes.push(mesh);
        index
    }

    /// Add an accessor and return its index.
    pub fn add_accessor(&mut self, accessor: Accessor) -> usize {
        let index = self.accessors.len();
        self.accessors.push(accessor);
        index
    }

    /// Add a buffer view and return its index.
    pub fn add_buffer_view(&mut self, view: BufferView) -> usize {
        let index = self.buffer_views.len();
        self.buffer_views.push(view);
        index
    }

    /// Add a buffer, stamp its own index into it, and return that index.
    pub fn add_buffer(&mut self, mut buffer: Buffer) -> usize {
        let index = self.buffers.len();
        buffer.index = index;
        self.buffers.push(buffer);
        index
    }

    /// Fill emission-time defaults.
    ///
    /// Sets the asset version to "2.0" when unset, recomputes every
    /// buffer's byte length from its live payload, and assigns the fixed
    /// filename scheme to uri-less buffers.
    pub fn finalize(&mut self) {
        if self.asset.version.is_none() {
            self.asset.version = Some("2.0".to_string());
        }

        for (index, buffer) in self.buffers.iter_mut().enumerate() {
            buffer.index = index;
            buffer.byte_length = buffer.data.len();
            if buffer.uri.is_none() {
                buffer.uri = Some(default_buffer_uri(index));
            }
        }
    }

    /// Collect a warning for every required field that is currently absent.
    ///
    /// Absence is not fatal: the serializer logs each warning and still
    /// emits the document with the field omitted.
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if self.asset.version.is_none() {
            warnings.push(ValidationWarning {
                entity: "Asset",
                index: 0,
                field: "version",
            });
        }

        for (index, mesh) in self.meshes.iter().enumerate() {
            if mesh.primitives.is_empty() {
                warnings.push(ValidationWarning {
                    entity: "Mesh",
                    index,
                    field: "primitives",
                });
            }

            for primitive in &mesh.primitives {
                if primitive.attributes.is_empty() {
                    warnings.push(ValidationWarning {
                        entity: "Primitive",
                        index,
                        field: "attributes",
                    });
                }
            }
        }

        for (index, accessor) in self.accessors.iter().enumerate() {
            if accessor.component_type.is_none() {
                warnings.push(ValidationWarning {
                    entity: "Accessor",
                    index,
                    field: "componentType",
                });
            }
            if accessor.count.is_none() {
                warnings.push(ValidationWarning {
                    entity: "Accessor",
                    index,
                    field: "count",
                });
            }
            if accessor.element_type.is_none() {
                warnings.push(ValidationWarning {
                    entity: "Accessor",
                    index,
                    field: "type",
                });
            }
        }

        for (index, view) in self.buffer_views.iter().enumerate() {
            if view.byte_length.is_none() {
                warnings.push(ValidationWarning {
                    entity: "BufferView",
                    index,
                    field: "byteLength",
                });
            }
        }

        warnings
    }

    /// Verify every cross-reference lands inside its target sequence and
    /// the node hierarchy is a forest.
    ///
    /// A dangling index is corruption, not a warning.
    pub fn check_references(&self) -> Result<()> {
        if let Some(scene) = self.scene {
            if scene >= self.scenes.len() {
                return Err(GltfError::InvalidData(format!(
                    "default scene index {} references missing scene",
                    scene
                )));
            }
        }

        for (index, scene) in self.scenes.iter().enumerate() {
            for &node in &scene.nodes {
                if node >= self.nodes.len() {
                    return Err(GltfError::InvalidData(format!(
                        "scene {} references missing node {}",
                        index, node
                    )));
                }
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            for &child in &node.children {
                if child >= self.nodes.len() {
                    return Err(GltfError::InvalidData(format!(
                        "node {} references missing child {}",
                        index, child
                    )));
                }
            }
            if let Some(mesh) = node.mesh {
                if mesh >= self.meshes.len() {
                    return Err(GltfError::InvalidData(format!(
                        "node {} references missing mesh {}",
                        index, mesh
                    )));
                }
            }
        }

        for (index, mesh) in self.meshes.iter().enumerate() {
            for primitive in &mesh.primitives {
                for (semantic, &accessor) in &primitive.attributes {
                    if accessor >= self.accessors.len() {
                        return Err(GltfError::InvalidData(format!(
                            "mesh {} attribute {} references missing accessor {}",
                            index, semantic, accessor
                        )));
                    }
                }
                if let Some(indices) = primitive.indices {
                    if indices >= self.accessors.len() {
                        return Err(GltfError::InvalidData(format!(
                            "mesh {} references missing index accessor {}",
                            index, indices
                        )));
                    }
                }
            }
        }

        for (index, accessor) in self.accessors.iter().enumerate() {
            if let Some(view) = accessor.buffer_view {
                if view >= self.buffer_views.len() {
                    return Err(GltfError::InvalidData(format!(
                        "accessor {} references missing buffer view {}",
                        index, view
                    )));
                }
            }
        }

        for (index, view) in self.buffer_views.iter().enumerate() {
            if view.buffer >= self.buffers.len() {
                return Err(GltfError::InvalidData(format!(
                    "buffer view {} references missing buffer {}",
                    index, view.buffer
                )));
            }
        }

        self.check_hierarchy()
    }

    /// Reject hierarchies where a node is its own ancestor.
    fn check_hierarchy(&self) -> Result<()> {
        // 0 = unvisited, 1 = on the current path, 2 = done.
        let mut state = vec![0u8; self.nodes.len()];

        for start in 0..self.nodes.len() {
            if state[start] != 0 {
                continue;
            }

            let mut stack = vec![(start, 0usize)];
            state[start] = 1;

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                if cursor < self.nodes[node].children.len() {
                    frame.1 += 1;
                    let child = self.nodes[node].children[cursor];
                    match state[child] {
                        0 => {
                            state[child] = 1;
                            stack.push((child, 0));
                        }
                        1 => {
                            return Err(GltfError::InvalidData(format!(
                                "node {} is its own ancestor",
                                child
                            )));
                        }
                        _ => {}
                    }
                } else {
                    state[node] = 2;
                    stack.pop();
                }
            }
        }

        Ok(())
    }
}
