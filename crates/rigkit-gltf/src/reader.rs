//! Document deserializer and directory import.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::{GltfError, Result};

/// Rebuild a document from description text plus named binary payloads.
///
/// Exactly one description is expected; the file-set errors fall out of
/// the counts. Entity declaration order is preserved verbatim, since it
/// is the index space every cross-reference points into.
pub fn deserialize(
    descriptions: &[&str],
    payloads: &BTreeMap<String, Vec<u8>>,
) -> Result<Document> {
    if payloads.is_empty() {
        return Err(GltfError::MissingAsset(
            "no binary payload files supplied".into(),
        ));
    }
    if descriptions.is_empty() {
        return Err(GltfError::MissingDescription(
            "no description file supplied".into(),
        ));
    }
    if descriptions.len() > 1 {
        return Err(GltfError::AmbiguousInput(format!(
            "{} description files supplied, expected exactly one",
            descriptions.len()
        )));
    }

    let mut document: Document = serde_json::from_str(descriptions[0])?;
    attach_payloads(&mut document, payloads)?;

    Ok(document)
}

/// Match each buffer's declared filename against the supplied payloads
/// and attach the bytes.
///
/// Exact name matches win; otherwise the first payload whose name
/// contains the declared reference is used.
fn attach_payloads(document: &mut Document, payloads: &BTreeMap<String, Vec<u8>>) -> Result<()> {
    for (index, buffer) in document.buffers.iter_mut().enumerate() {
        buffer.index = index;

        let reference = match buffer.uri.as_ref().or(buffer.name.as_ref()) {
            Some(reference) => reference.clone(),
            None => {
                return Err(GltfError::MissingAsset(format!(
                    "buffer {} declares no external file reference",
                    index
                )));
            }
        };

        let bytes = match payloads.get(&reference) {
            Some(bytes) => bytes,
            None => payloads
                .iter()
                .find(|(name, _)| name.contains(&reference))
                .map(|(_, bytes)| bytes)
                .ok_or_else(|| {
                    GltfError::MissingAsset(format!(
                        "no payload file matches buffer {} reference {}",
                        index, reference
                    ))
                })?,
        };

        buffer.data = bytes.clone();
    }

    Ok(())
}

/// Import one export directory.
///
/// Scans for `.gltf` and `.bin` files; zero binary files, or zero or
/// multiple descriptions, are file-set errors.
pub fn import_dir(dir: &Path) -> Result<Document> {
    let mut descriptions = Vec::new();
    let mut payloads = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match path.extension().and_then(|extension| extension.to_str()) {
            Some("gltf") => descriptions.push(fs::read_to_string(&path)?),
            Some("bin") => {
                let name = entry.file_name().to_string_lossy().into_owned();
                payloads.insert(name, fs::read(&path)?);
            }
            _ => {}
        }
    }

    let descriptions: Vec<&str> = descriptions.iter().map(String::as_str).collect();
    deserialize(&descriptions, &payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Buffer, Node, Scene};
    use crate::writer::{export_dir, serialize};

    fn sample_document() -> Document {
        let mut document = Document::new();
        document.asset.version = Some("2.0".to_string());
        document.add_node(Node {
            name: Some("pelvis".to_string()),
            children: vec![1],
            ..Default::default()
        });
        document.add_node(Node {
            name: Some("spine".to_string()),
            ..Default::default()
        });
        document.add_scene(Scene {
            nodes: vec![0],
            name: Some("rig".to_string()),
        });
        document.scene = Some(0);
        document.add_buffer(Buffer {
            uri: Some("payload.bin".to_string()),
            data: vec![7, 8, 9, 10],
            ..Default::default()
        });
        document
    }

    #[test]
    fn test_missing_payloads_is_missing_asset() {
        let payloads = BTreeMap::new();
        assert!(matches!(
            deserialize(&["{}"], &payloads),
            Err(GltfError::MissingAsset(_))
        ));
    }

    #[test]
    fn test_missing_description() {
        let mut payloads = BTreeMap::new();
        payloads.insert("out.bin".to_string(), vec![0u8; 4]);
        assert!(matches!(
            deserialize(&[], &payloads),
            Err(GltfError::MissingDescription(_))
        ));
    }

    #[test]
    fn test_multiple_descriptions_are_ambiguous() {
        let mut payloads = BTreeMap::new();
        payloads.insert("out.bin".to_string(), vec![0u8; 4]);
        assert!(matches!(
            deserialize(&["{}", "{}"], &payloads),
            Err(GltfError::AmbiguousInput(_))
        ));
    }

    #[test]
    fn test_round_trip_preserves_present_fields() {
        let document = sample_document();
        let (text, payloads) = serialize(&document).unwrap();

        let imported = deserialize(&[&text], &payloads).unwrap();

        let mut expected = document.clone();
        expected.finalize();
        assert_eq!(imported, expected);
    }

    #[test]
    fn test_substring_reference_matching() {
        let document = sample_document();
        let (text, _) = serialize(&document).unwrap();

        // Payload saved under a decorated name still matches the declared
        // reference by substring.
        let mut payloads = BTreeMap::new();
        payloads.insert("export_01_payload.bin".to_string(), vec![7, 8, 9, 10]);

        let imported = deserialize(&[&text], &payloads).unwrap();
        assert_eq!(imported.buffers[0].data, vec![7, 8, 9, 10]);
    }

    #[test]
    fn test_unmatched_reference_is_missing_asset() {
        let document = sample_document();
        let (text, _) = serialize(&document).unwrap();

        let mut payloads = BTreeMap::new();
        payloads.insert("other.bin".to_string(), vec![0u8; 4]);

        assert!(matches!(
            deserialize(&[&text], &payloads),
            Err(GltfError::MissingAsset(_))
        ));
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let document = sample_document();
        let (text, payloads) = serialize(&document).unwrap();

        let imported = deserialize(&[&text], &payloads).unwrap();
        assert_eq!(imported.nodes[0].name.as_deref(), Some("pelvis"));
        assert_eq!(imported.nodes[1].name.as_deref(), Some("spine"));
        assert_eq!(imported.nodes[0].children, vec![1]);
    }

    #[test]
    fn test_import_dir_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        export_dir(&sample_document(), dir.path()).unwrap();

        let imported = import_dir(dir.path()).unwrap();

        let mut expected = sample_document();
        expected.finalize();
        assert_eq!(imported, expected);
    }

    #[test]
    fn test_import_dir_without_binaries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scene.gltf"), "{}").unwrap();

        assert!(matches!(
            import_dir(dir.path()),
            Err(GltfError::MissingAsset(_))
        ));
    }

    #[test]
    fn test_import_dir_with_two_descriptions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.gltf"), "{}").unwrap();
        fs::write(dir.path().join("b.gltf"), "{}").unwrap();
        fs::write(dir.path().join("out.bin"), [0u8; 4]).unwrap();

        assert!(matches!(
            import_dir(dir.path()),
            Err(GltfError::AmbiguousInput(_))
        ));
    }

    #[test]
    fn test_import_dir_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        export_dir(&sample_document(), dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), "not part of the set").unwrap();

        assert!(import_dir(dir.path()).is_ok());
    }
}
