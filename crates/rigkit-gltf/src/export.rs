//! Build pass: scene graph to document.
//!
//! Nodes convert in declaration order, so the scene-graph index space
//! maps one-to-one onto the document's node sequence. All vertex and
//! index payloads append into a single shared buffer.

use glam::{Mat4, Vec3};
use indexmap::IndexMap;

use crate::component::{
    pack_scalars, smallest_index_type, COMPONENT_FLOAT, MODE_TRIANGLES, TARGET_ARRAY_BUFFER,
    TARGET_ELEMENT_ARRAY_BUFFER, TYPE_SCALAR, TYPE_VEC3,
};
use crate::document::{Accessor, Buffer, Document, Mesh, Node, Primitive, Scene};
use crate::error::Result;
use crate::pack::append_payload;
use crate::scene::{MeshData, SceneGraph};

/// Generator string stamped into exported documents.
const GENERATOR: &str = concat!("rigkit-gltf ", env!("CARGO_PKG_VERSION"));

/// Build a document from a scene graph.
pub fn build_document(scene: &SceneGraph) -> Result<Document> {
    let mut document = Document::new();
    document.asset.version = Some("2.0".to_string());
    document.asset.generator = Some(GENERATOR.to_string());

    let buffer_index = document.add_buffer(Buffer::default());

    for scene_node in &scene.nodes {
        let mesh = match &scene_node.mesh {
            Some(data) => Some(add_mesh(&mut document, buffer_index, data)?),
            None => None,
        };

        document.add_node(Node {
            name: if scene_node.name.is_empty() {
                None
            } else {
                Some(scene_node.name.clone())
            },
            children: scene_node.children.clone(),
            matrix: convert_transform(&scene_node.transform),
            mesh,
        });
    }

    if !scene.roots.is_empty() {
        document.add_scene(Scene {
            nodes: scene.roots.clone(),
            name: None,
        });
        document.scene = Some(0);
    }

    // No geometry crossed the boundary: drop the unused buffer.
    if document.buffers[buffer_index].data.is_empty() {
        document.buffers.clear();
    }

    Ok(document)
}

/// An identity transform becomes an absent matrix.
fn convert_transform(transform: &Mat4) -> Option<[f32; 16]> {
    if *transform == Mat4::IDENTITY {
        None
    } else {
        Some(transform.to_cols_array())
    }
}

/// Convert one triangulated mesh into a mesh with a single primitive.
fn add_mesh(document: &mut Document, buffer_index: usize, data: &MeshData) -> Result<usize> {
    let position_accessor = add_position_accessor(document, buffer_index, &data.positions)?;
    let index_accessor = add_index_accessor(document, buffer_index, &data.indices)?;

    let mut attributes = IndexMap::new();
    attributes.insert("POSITION".to_string(), position_accessor);

    Ok(document.add_mesh(Mesh {
        primitives: vec![Primitive {
            attributes,
            indices: Some(index_accessor),
            material: None,
            mode: MODE_TRIANGLES,
        }],
        weights: None,
        name: None,
    }))
}

/// Pack vertex positions and describe them with a FLOAT/VEC3 accessor.
fn add_position_accessor(
    document: &mut Document,
    buffer_index: usize,
    positions: &[Vec3],
) -> Result<usize> {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);

    for position in positions {
        min = min.min(*position);
        max = max.max(*position);
    }

    let values: Vec<f64> = positions
        .iter()
        .flat_map(|p| [p.x as f64, p.y as f64, p.z as f64])
        .collect();
    let payload = pack_scalars(&values, COMPONENT_FLOAT)?;

    let mut view = append_payload(&mut document.buffers[buffer_index], &payload)?;
    view.target = Some(TARGET_ARRAY_BUFFER);
    let view_index = document.add_buffer_view(view);

    Ok(document.add_accessor(Accessor {
        buffer_view: Some(view_index),
        component_type: Some(COMPONENT_FLOAT),
        count: Some(positions.len()),
        element_type: Some(TYPE_VEC3.to_string()),
        max: Some(vec![max.x as f64, max.y as f64, max.z as f64]),
        min: Some(vec![min.x as f64, min.y as f64, min.z as f64]),
        ..Default::default()
    }))
}

/// Pack triangle indices with the smallest component type that holds them.
fn add_index_accessor(
    document: &mut Document,
    buffer_index: usize,
    indices: &[u32],
) -> Result<usize> {
    let wide: Vec<u64> = indices.iter().map(|&i| i as u64).collect();
    let component_type = smallest_index_type(&wide)?;

    let values: Vec<f64> = indices.iter().map(|&i| i as f64).collect();
    let payload = pack_scalars(&values, component_type)?;

    let mut view = append_payload(&mut document.buffers[buffer_index], &payload)?;
    view.target = Some(TARGET_ELEMENT_ARRAY_BUFFER);
    let view_index = document.add_buffer_view(view);

    Ok(document.add_accessor(Accessor {
        buffer_view: Some(view_index),
        component_type: Some(component_type),
        count: Some(indices.len()),
        element_type: Some(TYPE_SCALAR.to_string()),
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{COMPONENT_UNSIGNED_BYTE, COMPONENT_UNSIGNED_SHORT};
    use crate::scene::SceneNode;

    fn triangle() -> MeshData {
        MeshData {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 1.0, 0.0),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_build_simple_mesh() {
        let mut scene = SceneGraph::new();
        scene.add_root(SceneNode::new("tri").with_mesh(triangle()));

        let document = build_document(&scene).unwrap();

        assert_eq!(document.nodes.len(), 1);
        assert_eq!(document.meshes.len(), 1);
        assert_eq!(document.accessors.len(), 2);
        assert_eq!(document.buffer_views.len(), 2);
        assert_eq!(document.buffers.len(), 1);
        assert_eq!(document.scene, Some(0));
        assert_eq!(document.scenes[0].nodes, vec![0]);
        assert!(document.check_references().is_ok());

        let primitive = &document.meshes[0].primitives[0];
        assert_eq!(primitive.mode, MODE_TRIANGLES);
        assert_eq!(primitive.attributes.get("POSITION"), Some(&0));
        assert_eq!(primitive.indices, Some(1));
    }

    #[test]
    fn test_position_accessor_bounds() {
        let mut scene = SceneGraph::new();
        scene.add_root(SceneNode::new("tri").with_mesh(triangle()));

        let document = build_document(&scene).unwrap();
        let positions = &document.accessors[0];

        assert_eq!(positions.component_type, Some(COMPONENT_FLOAT));
        assert_eq!(positions.element_type.as_deref(), Some("VEC3"));
        assert_eq!(positions.count, Some(3));
        assert_eq!(positions.min, Some(vec![0.0, 0.0, 0.0]));
        assert_eq!(positions.max, Some(vec![1.0, 1.0, 0.0]));
    }

    #[test]
    fn test_buffer_layout_is_aligned() {
        let mut scene = SceneGraph::new();
        scene.add_root(SceneNode::new("tri").with_mesh(triangle()));

        let document = build_document(&scene).unwrap();

        // 36 position bytes, then 3 single-byte indices padded to 4.
        let position_view = &document.buffer_views[0];
        assert_eq!(position_view.byte_offset, 0);
        assert_eq!(position_view.byte_length, Some(36));
        assert_eq!(position_view.target, Some(TARGET_ARRAY_BUFFER));

        let index_view = &document.buffer_views[1];
        assert_eq!(index_view.byte_offset, 36);
        assert_eq!(index_view.byte_length, Some(3));
        assert_eq!(index_view.target, Some(TARGET_ELEMENT_ARRAY_BUFFER));

        assert_eq!(document.buffers[0].data.len(), 40);
    }

    #[test]
    fn test_index_width_promotion() {
        let mut small = triangle();
        small.indices = vec![0, 1, 2];

        let mut wide = MeshData {
            positions: (0..=260)
                .map(|i| Vec3::new(i as f32, 0.0, 0.0))
                .collect(),
            indices: (0..=260).collect(),
        };
        wide.indices.rotate_left(1);

        let mut scene = SceneGraph::new();
        scene.add_root(SceneNode::new("small").with_mesh(small));
        scene.add_root(SceneNode::new("wide").with_mesh(wide));

        let document = build_document(&scene).unwrap();

        let small_indices = &document.accessors[1];
        assert_eq!(small_indices.component_type, Some(COMPONENT_UNSIGNED_BYTE));

        // Max index 260 is past the 255 cutoff, so indices are 16-bit.
        let wide_indices = &document.accessors[3];
        assert_eq!(wide_indices.component_type, Some(COMPONENT_UNSIGNED_SHORT));
        assert_eq!(wide_indices.count, Some(261));
    }

    #[test]
    fn test_identity_transform_becomes_absent_matrix() {
        let mut scene = SceneGraph::new();
        let root = scene.add_root(SceneNode::new("root"));
        scene.add_child(
            root,
            SceneNode::new("offset").transformed(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))),
        );

        let document = build_document(&scene).unwrap();

        assert!(document.nodes[0].matrix.is_none());
        let matrix = document.nodes[1].matrix.unwrap();
        assert_eq!(&matrix[12..15], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_hierarchy_only_scene_has_no_buffer() {
        let mut scene = SceneGraph::new();
        let root = scene.add_root(SceneNode::new("root"));
        scene.add_child(root, SceneNode::new("child"));

        let document = build_document(&scene).unwrap();

        assert!(document.buffers.is_empty());
        assert!(document.buffer_views.is_empty());
        assert_eq!(document.nodes[0].children, vec![1]);
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let mut scene = SceneGraph::new();
        scene.add_root(SceneNode::new("empty").with_mesh(MeshData::default()));

        assert!(build_document(&scene).is_err());
    }
}
