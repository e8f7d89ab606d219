//! Rebuild pass: document to scene graph.
//!
//! Runs three passes over the node sequence so forward references to
//! not-yet-created children are harmless: create every node in document
//! order, then link children, then apply matrices.

use glam::{Mat4, Vec3};

use crate::component::{
    component_width, element_count, COMPONENT_FLOAT, COMPONENT_UNSIGNED_BYTE,
    COMPONENT_UNSIGNED_INT, COMPONENT_UNSIGNED_SHORT, MODE_TRIANGLES, TYPE_SCALAR, TYPE_VEC3,
};
use crate::document::{Accessor, Document};
use crate::error::{GltfError, Result};
use crate::scene::{MeshData, SceneGraph, SceneNode};

/// Rebuild a scene graph from a parsed document.
pub fn rebuild_scene(document: &Document) -> Result<SceneGraph> {
    document.check_references()?;

    let mut scene = SceneGraph::new();

    // Pass 1: create every node in document order.
    for node in &document.nodes {
        let mesh = match node.mesh {
            Some(mesh_index) => Some(read_mesh(document, mesh_index)?),
            None => None,
        };

        scene.nodes.push(SceneNode {
            name: node.name.clone().unwrap_or_default(),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            mesh,
        });
    }

    // Pass 2: link children. Every referenced index exists by now.
    for (index, node) in document.nodes.iter().enumerate() {
        scene.nodes[index].children = node.children.clone();
    }

    // Pass 3: apply matrices. An absent matrix is the identity.
    for (index, node) in document.nodes.iter().enumerate() {
        if let Some(matrix) = &node.matrix {
            scene.nodes[index].transform = Mat4::from_cols_array(matrix);
        }
    }

    scene.roots = root_indices(document);

    Ok(scene)
}

/// Roots come from the default scene (or scene 0); a document with no
/// scenes falls back to every node that no other node claims as a child.
fn root_indices(document: &Document) -> Vec<usize> {
    if !document.scenes.is_empty() {
        let scene_index = document.scene.unwrap_or(0).min(document.scenes.len() - 1);
        return document.scenes[scene_index].nodes.clone();
    }

    let mut has_parent = vec![false; document.nodes.len()];
    for node in &document.nodes {
        for &child in &node.children {
            has_parent[child] = true;
        }
    }

    has_parent
        .iter()
        .enumerate()
        .filter(|(_, claimed)| !**claimed)
        .map(|(index, _)| index)
        .collect()
}

/// Decode one mesh. Triangle primitives are concatenated, with indices
/// rebased onto the merged vertex list.
fn read_mesh(document: &Document, mesh_index: usize) -> Result<MeshData> {
    let mesh = &document.meshes[mesh_index];
    let mut data = MeshData::default();

    for primitive in &mesh.primitives {
        if primitive.mode != MODE_TRIANGLES {
            continue;
        }

        let position_accessor = match primitive.attributes.get("POSITION") {
            Some(&accessor) => accessor,
            None => continue,
        };

        let positions = read_positions(document, position_accessor)?;
        let base = data.positions.len() as u32;

        let indices = match primitive.indices {
            Some(accessor) => read_indices(document, accessor)?,
            None => (0..positions.len() as u32).collect(),
        };

        data.positions.extend(positions);
        data.indices.extend(indices.into_iter().map(|i| base + i));
    }

    Ok(data)
}

/// A resolved accessor: the owning buffer's bytes plus the layout needed
/// to walk its elements.
struct ResolvedAccessor<'a> {
    accessor: &'a Accessor,
    data: &'a [u8],
    start: usize,
    stride: usize,
    count: usize,
}

fn resolve_accessor(document: &Document, accessor_index: usize) -> Result<ResolvedAccessor<'_>> {
    let accessor = &document.accessors[accessor_index];

    let view_index = accessor.buffer_view.ok_or_else(|| {
        GltfError::InvalidData(format!("accessor {} has no buffer view", accessor_index))
    })?;
    let view = &document.buffer_views[view_index];
    let buffer = &document.buffers[view.buffer];

    let byte_length = view.byte_length.ok_or_else(|| {
        GltfError::InvalidData(format!("buffer view {} has no byteLength", view_index))
    })?;
    if view.byte_offset + byte_length > buffer.data.len() {
        return Err(GltfError::InvalidData(format!(
            "buffer view {} extends past the end of buffer {}",
            view_index, view.buffer
        )));
    }

    let component_type = accessor.component_type.ok_or_else(|| {
        GltfError::InvalidData(format!("accessor {} has no componentType", accessor_index))
    })?;
    let element_type = accessor.element_type.as_deref().ok_or_else(|| {
        GltfError::InvalidData(format!("accessor {} has no type", accessor_index))
    })?;
    let count = accessor.count.ok_or_else(|| {
        GltfError::InvalidData(format!("accessor {} has no count", accessor_index))
    })?;

    let element_width = component_width(component_type)? * element_count(element_type)?;
    let stride = view.byte_stride.unwrap_or(element_width);
    let start = view.byte_offset + accessor.byte_offset;

    if count > 0 {
        let last = start + (count - 1) * stride + element_width;
        if last > view.byte_offset + byte_length {
            return Err(GltfError::InvalidData(format!(
                "accessor {} reads past its buffer view",
                accessor_index
            )));
        }
    }

    Ok(ResolvedAccessor {
        accessor,
        data: &buffer.data,
        start,
        stride,
        count,
    })
}

/// Read a FLOAT/VEC3 accessor as vertex positions.
fn read_positions(document: &Document, accessor_index: usize) -> Result<Vec<Vec3>> {
    let resolved = resolve_accessor(document, accessor_index)?;

    if resolved.accessor.element_type.as_deref() != Some(TYPE_VEC3)
        || resolved.accessor.component_type != Some(COMPONENT_FLOAT)
    {
        return Err(GltfError::InvalidData(format!(
            "accessor {} is not FLOAT/VEC3 position data",
            accessor_index
        )));
    }

    let mut positions = Vec::with_capacity(resolved.count);
    for i in 0..resolved.count {
        let offset = resolved.start + i * resolved.stride;
        let x = read_f32(resolved.data, offset);
        let y = read_f32(resolved.data, offset + 4);
        let z = read_f32(resolved.data, offset + 8);
        positions.push(Vec3::new(x, y, z));
    }

    Ok(positions)
}

/// Read a SCALAR accessor as triangle indices, widening to u32.
fn read_indices(document: &Document, accessor_index: usize) -> Result<Vec<u32>> {
    let resolved = resolve_accessor(document, accessor_index)?;

    if resolved.accessor.element_type.as_deref() != Some(TYPE_SCALAR) {
        return Err(GltfError::InvalidData(format!(
            "accessor {} is not SCALAR index data",
            accessor_index
        )));
    }

    let mut indices = Vec::with_capacity(resolved.count);
    for i in 0..resolved.count {
        let offset = resolved.start + i * resolved.stride;
        let index = match resolved.accessor.component_type {
            Some(COMPONENT_UNSIGNED_BYTE) => resolved.data[offset] as u32,
            Some(COMPONENT_UNSIGNED_SHORT) => {
                u16::from_le_bytes([resolved.data[offset], resolved.data[offset + 1]]) as u32
            }
            Some(COMPONENT_UNSIGNED_INT) => u32::from_le_bytes([
                resolved.data[offset],
                resolved.data[offset + 1],
                resolved.data[offset + 2],
                resolved.data[offset + 3],
            ]),
            other => {
                return Err(GltfError::InvalidData(format!(
                    "unsupported index component type: {:?}",
                    other
                )));
            }
        };
        indices.push(index);
    }

    Ok(indices)
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
