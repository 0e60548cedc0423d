//! Built-in glob loader.
//!
//! Enumerates the content files of one collection and drives them through
//! a full load cycle: the authoritative metadata mapping is built once, the
//! metadata source documents are handed to the watcher, then every file's
//! declared data is resolved, validated, rendered, and finalized.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;

use crate::config::CollectionConfig;
use crate::frontmatter::split_frontmatter;
use crate::layers::{intercept_parse_data, intercept_store, MetadataLayers};
use crate::models::{ParseRequest, StoreRequest, StoredEntry};
use crate::sources::{collect_source_document_paths, to_forward_slashes};
use crate::traits::{MetadataValidator, PathWatcher, Renderer};

/// Optional collaborators for a load cycle.
#[derive(Default, Clone, Copy)]
pub struct LoadHooks<'a> {
    pub validator: Option<&'a dyn MetadataValidator>,
    pub renderer: Option<&'a dyn Renderer>,
    pub watcher: Option<&'a dyn PathWatcher>,
}

/// A content file selected by the collection's patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    /// Path relative to the collection base, forward slashes.
    pub relative: String,
    /// Path as handed to the resolver (`base` joined with `relative`).
    pub path: PathBuf,
}

/// Run one load cycle for a collection and return its stored entries,
/// sorted by id.
pub fn load_collection(config: &CollectionConfig, hooks: LoadHooks<'_>) -> Result<Vec<StoredEntry>> {
    let options = config.source_options();
    let layers = Arc::new(MetadataLayers::build(&options)?);

    if let Some(watcher) = hooks.watcher {
        let sources = collect_source_document_paths(&options);
        if !sources.is_empty() {
            let absolute = sources
                .iter()
                .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
                .collect::<Vec<_>>();
            watcher.add_paths(&absolute);
        }
    }

    let parse_data = intercept_parse_data(layers.clone(), |request: ParseRequest| {
        match hooks.validator {
            Some(validator) => validator.validate(request),
            None => Ok(request.data),
        }
    });
    let store = intercept_store(|request: StoreRequest| StoredEntry::from(request));

    let files = scan_content_files(config)?;
    let mut entries = Vec::with_capacity(files.len());

    for file in &files {
        let text = std::fs::read_to_string(&file.path)
            .with_context(|| format!("Failed to read content file: {}", file.path.display()))?;
        let (declared, body) = split_frontmatter(&text, &file.path)?;
        let id = entry_id(&file.relative);

        let data = parse_data(ParseRequest {
            id: id.clone(),
            data: declared,
            file_path: Some(file.path.clone()),
        })
        .with_context(|| format!("Invalid metadata for entry '{}'", id))?;

        let rendered = match hooks.renderer {
            Some(renderer) => Some(
                renderer
                    .render(body)
                    .with_context(|| format!("Failed to render {}", file.path.display()))?,
            ),
            None => None,
        };

        entries.push(store(StoreRequest {
            id,
            data,
            body: Some(body.to_string()),
            rendered,
            file_path: Some(file.path.clone()),
        }));
    }

    info!(
        base = %layers.base().display(),
        entries = entries.len(),
        metadata_paths = layers.mapping().len(),
        "loaded collection"
    );

    Ok(entries)
}

/// Enumerate the files matching the collection's patterns, sorted by
/// relative path.
pub fn scan_content_files(config: &CollectionConfig) -> Result<Vec<ContentFile>> {
    let root = &config.base;
    if !root.exists() {
        anyhow::bail!("Collection base does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.pattern.to_vec())?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = to_forward_slashes(relative);

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(ContentFile {
            relative: rel_str,
            path: path.to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    Ok(files)
}

/// Entry id: the relative path without its extension.
pub fn entry_id(relative: &str) -> String {
    let path = Path::new(relative);
    to_forward_slashes(&path.with_extension(""))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
