//! Document serializer and directory export.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{default_buffer_uri, Document};
use crate::error::Result;

/// Filename of the structured description inside an export directory.
pub const DESCRIPTION_FILENAME: &str = "scene.gltf";

/// Serialize a document to its description text plus one payload per buffer.
///
/// The description is pretty-printed JSON with stable key order, UTF-8,
/// newline-terminated. Payloads are keyed by each buffer's external
/// filename. Required fields that are still absent after emission-time
/// defaulting are logged and the document is emitted without them.
pub fn serialize(document: &Document) -> Result<(String, BTreeMap<String, Vec<u8>>)> {
    let mut document = document.clone();
    document.finalize();

    for warning in document.validate() {
        tracing::warn!("{}", warning);
    }

    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');

    let mut payloads = BTreeMap::new();
    for (index, buffer) in document.buffers.iter().enumerate() {
        let uri = buffer
            .uri
            .clone()
            .unwrap_or_else(|| default_buffer_uri(index));
        payloads.insert(uri, buffer.data.clone());
    }

    Ok((text, payloads))
}

/// Serialize a document and persist it into one directory.
///
/// Writes the description as `scene.gltf` plus every payload under its
/// own filename, creating the directory if needed. Returns the
/// description path.
pub fn export_dir(document: &Document, dir: &Path) -> Result<PathBuf> {
    let (text, payloads) = serialize(document)?;

    fs::create_dir_all(dir)?;

    let description_path = dir.join(DESCRIPTION_FILENAME);
    fs::write(&description_path, text)?;

    for (name, bytes) in &payloads {
        fs::write(dir.join(name), bytes)?;
    }

    Ok(description_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Buffer, Node, Scene};

    fn sample_document() -> Document {
        let mut document = Document::new();
        document.add_node(Node {
            name: Some("root".to_string()),
            ..Default::default()
        });
        document.add_scene(Scene {
            nodes: vec![0],
            name: None,
        });
        document.scene = Some(0);
        document.add_buffer(Buffer {
            data: vec![1, 2, 3, 4],
            ..Default::default()
        });
        document
    }

    #[test]
    fn test_serialize_shape() {
        let (text, payloads) = serialize(&sample_document()).unwrap();

        assert!(text.starts_with('{'));
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"asset\""));
        assert!(text.contains("\"version\": \"2.0\""));

        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads.get("out.bin").unwrap(), &vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let document = sample_document();
        let first = serialize(&document).unwrap();
        let second = serialize(&document).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialize_does_not_mutate_input() {
        let document = sample_document();
        serialize(&document).unwrap();
        // Defaults were filled on a clone only.
        assert!(document.asset.version.is_none());
        assert!(document.buffers[0].uri.is_none());
    }

    #[test]
    fn test_serialize_recomputes_byte_length() {
        let mut document = sample_document();
        document.buffers[0].byte_length = 999;

        let (text, _) = serialize(&document).unwrap();
        assert!(text.contains("\"byteLength\": 4"));
    }

    #[test]
    fn test_export_dir_writes_file_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_dir(&sample_document(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join("scene.gltf"));
        assert!(path.is_file());
        assert_eq!(fs::read(dir.path().join("out.bin")).unwrap(), vec![1, 2, 3, 4]);
    }
}
