//! Metadata source resolution.
//!
//! External metadata comes from two places:
//!
//! - a single **centralized** file (YAML or JSON), keyed either
//!   hierarchically (`guides: { installation.md: {...} }`) or flat
//!   (`guides/installation.md: {...}`), or a mix of both;
//! - **per-directory** `_meta.yml` / `_meta.yaml` / `_meta.json` documents
//!   scattered through the content tree, keyed relative to their own
//!   directory.
//!
//! Both are normalized into a [`SourceMapping`] and combined by
//! [`build_authoritative_mapping`], with per-directory values winning.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::frontmatter::kind_of;
use crate::merge::deep_merge;
use crate::models::{MetadataRecord, SourceMapping};

/// File extensions that mark a key as a content file rather than a directory.
pub const CONTENT_EXTENSIONS: [&str; 3] = ["md", "mdx", "mdoc"];

/// Per-directory document names, in priority order. At most one per
/// directory is honoured.
pub const DIRECTORY_DOCUMENT_NAMES: [&str; 3] = ["_meta.yml", "_meta.yaml", "_meta.json"];

/// Directory names never descended into, besides hidden directories.
pub const SKIPPED_DIRECTORIES: [&str; 3] = ["node_modules", "target", "vendor"];

/// Where to look for external metadata.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Optional centralized metadata file.
    pub central_file: Option<PathBuf>,
    /// Content base directory; per-directory documents are searched below it
    /// and every mapping key is relative to it.
    pub base: PathBuf,
}

/// A per-directory document found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDocument {
    /// The directory's path relative to the base, forward slashes, empty at the root.
    pub directory: String,
    /// Path of the document file itself.
    pub document: PathBuf,
}

/// Read and parse a metadata source file.
///
/// `.json` files are parsed as JSON, everything else as YAML. A missing
/// file is an empty object; a malformed one is an error naming the path.
pub fn parse_source_document(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Ok(Value::Object(MetadataRecord::new()));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata source: {}", path.display()))?;

    let value = if has_extension(path, &["json"]) {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata source: {}", path.display()))?
    } else if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse metadata source: {}", path.display()))?
    };

    Ok(match value {
        Value::Null => Value::Object(MetadataRecord::new()),
        other => other,
    })
}

/// Flatten a parsed source document into path → record pairs.
///
/// A key whose extension is a content extension is a leaf; its value must
/// be an object and is ignored otherwise. Every other key is a directory
/// segment and is recursed into. Both shapes may appear in one document;
/// a path produced twice is deep-merged in iteration order.
pub fn flatten_hierarchical(structure: &Value) -> SourceMapping {
    let mut mapping = SourceMapping::new();
    flatten_into(structure, "", &mut mapping);
    mapping
}

fn flatten_into(value: &Value, prefix: &str, mapping: &mut SourceMapping) {
    let Value::Object(map) = value else {
        return;
    };

    for (key, child) in map {
        let segment = key.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        let path = join_relative(prefix, segment);

        if is_content_path(segment) {
            if let Value::Object(record) = child {
                insert_merged(mapping, path, record);
            }
        } else {
            flatten_into(child, &path, mapping);
        }
    }
}

/// Lazily walk `base` and yield the honoured per-directory document of
/// every directory that has one. Hidden and dependency directories are
/// skipped. A missing `base` yields nothing.
pub fn discover_per_directory_documents(
    base: &Path,
) -> impl Iterator<Item = DirectoryDocument> + '_ {
    let walker = base.is_dir().then(|| {
        WalkDir::new(base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_type().is_dir() && !is_skipped_directory(entry))
    });

    walker
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .filter_map(move |entry| {
            let document = DIRECTORY_DOCUMENT_NAMES
                .iter()
                .map(|name| entry.path().join(name))
                .find(|candidate| candidate.is_file())?;
            let relative = entry.path().strip_prefix(base).unwrap_or(Path::new(""));
            Some(DirectoryDocument {
                directory: to_forward_slashes(relative),
                document,
            })
        })
}

/// Parse every per-directory document under `base` and prefix its keys
/// with the document's directory.
pub fn load_per_directory_mapping(base: &Path) -> Result<SourceMapping> {
    let mut mapping = SourceMapping::new();
    for found in discover_per_directory_documents(base) {
        debug!(document = %found.document.display(), "reading per-directory metadata");
        let parsed = parse_source_document(&found.document)?;
        if !parsed.is_object() {
            debug!(
                document = %found.document.display(),
                "ignoring metadata document whose top level is {}",
                kind_of(&parsed)
            );
            continue;
        }
        for (path, record) in flatten_hierarchical(&parsed) {
            insert_merged(&mut mapping, join_relative(&found.directory, &path), &record);
        }
    }
    Ok(mapping)
}

/// Parse and flatten the centralized file, if any.
pub fn load_central_mapping(central_file: Option<&Path>) -> Result<SourceMapping> {
    match central_file {
        Some(path) => Ok(flatten_hierarchical(&parse_source_document(path)?)),
        None => Ok(SourceMapping::new()),
    }
}

/// Combine the centralized and per-directory sources into the mapping
/// consulted during resolution. Per-directory records are deep-merged over
/// centralized ones for the same path.
pub fn build_authoritative_mapping(options: &SourceOptions) -> Result<SourceMapping> {
    let mut mapping = load_central_mapping(options.central_file.as_deref())?;
    let local = load_per_directory_mapping(&options.base)?;

    for (path, record) in local {
        let combined = match mapping.get(&path) {
            Some(central) => deep_merge(central, &record),
            None => record,
        };
        mapping.insert(path, combined);
    }

    Ok(mapping)
}

/// Every metadata source file that contributes to the mapping: the
/// centralized file (when it exists) followed by each per-directory
/// document.
pub fn collect_source_document_paths(options: &SourceOptions) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(central) = &options.central_file {
        if central.is_file() {
            paths.push(central.clone());
        }
    }
    paths.extend(discover_per_directory_documents(&options.base).map(|found| found.document));
    paths
}

fn insert_merged(mapping: &mut SourceMapping, path: String, record: &MetadataRecord) {
    let combined = match mapping.get(&path) {
        Some(existing) => deep_merge(existing, record),
        None => deep_merge(&MetadataRecord::new(), record),
    };
    mapping.insert(path, combined);
}

fn is_skipped_directory(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRECTORIES.contains(&&*name)
}

fn is_content_path(key: &str) -> bool {
    has_extension(Path::new(key), &CONTENT_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn join_relative(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn record(value: Value) -> MetadataRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_flatten_hierarchical_and_flat_agree() {
        let nested = flatten_hierarchical(&json!({
            "guides": {"installation.md": {"sidebar": {"order": 1}}}
        }));
        let flat = flatten_hierarchical(&json!({
            "guides/installation.md": {"sidebar": {"order": 1}}
        }));
        assert_eq!(nested, flat);
        assert_eq!(
            nested.get("guides/installation.md"),
            Some(&record(json!({"sidebar": {"order": 1}})))
        );
    }

    #[test]
    fn test_flatten_mixed_shapes_and_depths() {
        let mapping = flatten_hierarchical(&json!({
            "index.mdx": {"title": "Home"},
            "reference/api/client.mdoc": {"badge": "beta"},
            "reference": {"api": {"server.md": {"badge": "stable"}}}
        }));
        assert_eq!(mapping.len(), 3);
        assert!(mapping.contains_key("index.mdx"));
        assert!(mapping.contains_key("reference/api/client.mdoc"));
        assert!(mapping.contains_key("reference/api/server.md"));
    }

    #[test]
    fn test_flatten_skips_non_record_leaves() {
        let mapping = flatten_hierarchical(&json!({
            "a.md": ["not", "a", "record"],
            "b.md": "scalar",
            "c.md": {"ok": true},
            "dir": "not a directory"
        }));
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("c.md"));
    }

    #[test]
    fn test_flatten_collision_within_document_merges() {
        let mapping = flatten_hierarchical(&json!({
            "guides": {"a.md": {"x": 1}},
            "guides/a.md": {"y": 2}
        }));
        assert_eq!(mapping["guides/a.md"], record(json!({"x": 1, "y": 2})));
    }

    #[test]
    fn test_parse_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let value = parse_source_document(&tmp.path().join("nope.yml")).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_parse_empty_yaml_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("meta.yml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(parse_source_document(&path).unwrap(), json!({}));
    }

    #[test]
    fn test_parse_malformed_names_path() {
        let tmp = TempDir::new().unwrap();
        let yaml = tmp.path().join("broken.yml");
        fs::write(&yaml, "a.md: [unclosed").unwrap();
        let err = parse_source_document(&yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.yml"));

        let json_path = tmp.path().join("broken.json");
        fs::write(&json_path, "{\"a.md\": ").unwrap();
        let err = parse_source_document(&json_path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn test_discovery_honours_priority_and_skips_dirs() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("guides")).unwrap();
        fs::create_dir_all(base.join(".hidden")).unwrap();
        fs::create_dir_all(base.join("node_modules/pkg")).unwrap();
        fs::write(base.join("_meta.json"), "{}").unwrap();
        fs::write(base.join("guides/_meta.json"), "{}").unwrap();
        fs::write(base.join("guides/_meta.yml"), "").unwrap();
        fs::write(base.join(".hidden/_meta.yml"), "").unwrap();
        fs::write(base.join("node_modules/pkg/_meta.yml"), "").unwrap();

        let found: Vec<DirectoryDocument> = discover_per_directory_documents(base).collect();
        assert_eq!(
            found,
            vec![
                DirectoryDocument {
                    directory: String::new(),
                    document: base.join("_meta.json"),
                },
                DirectoryDocument {
                    directory: "guides".to_string(),
                    document: base.join("guides/_meta.yml"),
                },
            ]
        );
    }

    #[test]
    fn test_discovery_missing_base_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(discover_per_directory_documents(&tmp.path().join("absent")).count(), 0);
        assert!(load_per_directory_mapping(&tmp.path().join("absent"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_per_directory_keys_are_prefixed() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("guides/advanced")).unwrap();
        fs::write(base.join("_meta.yml"), "index.md:\n  sidebar:\n    order: 0\n").unwrap();
        fs::write(
            base.join("guides/advanced/_meta.yml"),
            "tuning.md:\n  sidebar:\n    order: 3\n",
        )
        .unwrap();

        let mapping = load_per_directory_mapping(base).unwrap();
        assert_eq!(
            mapping["index.md"],
            record(json!({"sidebar": {"order": 0}}))
        );
        assert_eq!(
            mapping["guides/advanced/tuning.md"],
            record(json!({"sidebar": {"order": 3}}))
        );
    }

    #[test]
    fn test_authoritative_mapping_local_wins_per_key() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("docs");
        fs::create_dir_all(base.join("guides")).unwrap();
        let central = tmp.path().join("meta.yml");
        fs::write(
            &central,
            "guides:\n  install.md:\n    description: central\n    sidebar:\n      order: 9\n      label: Install\nonly-central.md:\n  draft: true\n",
        )
        .unwrap();
        fs::write(
            base.join("guides/_meta.yml"),
            "install.md:\n  sidebar:\n    order: 1\nonly-local.md:\n  badge: new\n",
        )
        .unwrap();

        let mapping = build_authoritative_mapping(&SourceOptions {
            central_file: Some(central),
            base,
        })
        .unwrap();

        assert_eq!(
            mapping["guides/install.md"],
            record(json!({
                "description": "central",
                "sidebar": {"order": 1, "label": "Install"}
            }))
        );
        assert_eq!(mapping["only-central.md"], record(json!({"draft": true})));
        assert_eq!(mapping["guides/only-local.md"], record(json!({"badge": "new"})));
    }

    #[test]
    fn test_authoritative_mapping_empty_when_no_sources() {
        let tmp = TempDir::new().unwrap();
        let mapping = build_authoritative_mapping(&SourceOptions {
            central_file: Some(tmp.path().join("missing.yml")),
            base: tmp.path().to_path_buf(),
        })
        .unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_malformed_local_document_aborts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("_meta.json"), "{ nope").unwrap();
        let err = build_authoritative_mapping(&SourceOptions {
            central_file: None,
            base: tmp.path().to_path_buf(),
        })
        .unwrap_err();
        assert!(format!("{:#}", err).contains("_meta.json"));
    }

    #[test]
    fn test_collect_source_document_paths() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("docs");
        fs::create_dir_all(base.join("a")).unwrap();
        fs::write(base.join("a/_meta.yaml"), "").unwrap();
        let central = tmp.path().join("meta.json");

        let options = SourceOptions {
            central_file: Some(central.clone()),
            base: base.clone(),
        };
        assert_eq!(collect_source_document_paths(&options), vec![base.join("a/_meta.yaml")]);

        fs::write(&central, "{}").unwrap();
        assert_eq!(
            collect_source_document_paths(&options),
            vec![central, base.join("a/_meta.yaml")]
        );
    }

    #[test]
    fn test_collect_nothing() {
        let tmp = TempDir::new().unwrap();
        let options = SourceOptions {
            central_file: None,
            base: tmp.path().join("absent"),
        };
        assert!(collect_source_document_paths(&options).is_empty());
    }
}
