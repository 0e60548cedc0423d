//! Per-file metadata resolution.
//!
//! [`MetadataLayers`] holds the authoritative mapping for one load cycle
//! and resolves each file's final metadata in layers, lowest precedence
//! first:
//!
//! 1. centralized metadata file
//! 2. per-directory `_meta` documents
//! 3. the file's own frontmatter
//!
//! When none of these supplies a `title`, the file's leading `# ` heading
//! becomes the title. Once the entry is rendered, [`finalize`] removes that
//! heading from the raw body, the HTML, and the heading outline.
//!
//! [`intercept_parse_data`] and [`intercept_store`] wrap the collaborator
//! callbacks of a discovery loader with this behaviour.

use anyhow::Result;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::frontmatter::body_after_fence;
use crate::heading::{extract_leading_heading, strip_rendered_heading};
use crate::merge::deep_merge;
use crate::models::{MetadataRecord, ParseRequest, SourceMapping, StoreRequest};
use crate::sources::{build_authoritative_mapping, to_forward_slashes, SourceOptions};

const TITLE_KEY: &str = "title";

/// Read-only resolution state for one load cycle.
#[derive(Debug, Clone)]
pub struct MetadataLayers {
    base: PathBuf,
    mapping: SourceMapping,
}

impl MetadataLayers {
    /// Traverse the sources described by `options` and build the mapping.
    pub fn build(options: &SourceOptions) -> Result<Self> {
        let mapping = build_authoritative_mapping(options)?;
        debug!(
            base = %options.base.display(),
            entries = mapping.len(),
            "built authoritative metadata mapping"
        );
        Ok(Self::from_mapping(options.base.clone(), mapping))
    }

    pub fn from_mapping(base: impl Into<PathBuf>, mapping: SourceMapping) -> Self {
        Self {
            base: base.into(),
            mapping,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn mapping(&self) -> &SourceMapping {
        &self.mapping
    }

    /// Mapping key for a content file: its path relative to the base,
    /// with forward slashes.
    pub fn relative_key(&self, file_path: &Path) -> String {
        let file = without_cur_dir(file_path);
        let base = without_cur_dir(&self.base);

        if let Ok(rest) = file.strip_prefix(&base) {
            return to_forward_slashes(rest);
        }
        if file.is_absolute() && !base.is_absolute() {
            if let Ok(absolute_base) = std::path::absolute(&base) {
                if let Ok(rest) = file.strip_prefix(&absolute_base) {
                    return to_forward_slashes(rest);
                }
            }
        }
        to_forward_slashes(&file)
    }

    /// External metadata recorded for a content file, or an empty record.
    pub fn external_for(&self, file_path: &Path) -> MetadataRecord {
        self.mapping
            .get(&self.relative_key(file_path))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve a parse-metadata request: merge external metadata beneath
    /// the declared data and inject a heading-derived title if none is set.
    ///
    /// Requests without a file path pass through untouched.
    pub fn resolve(&self, request: ParseRequest) -> ParseRequest {
        let Some(file_path) = request.file_path.as_deref() else {
            return request;
        };

        let external = self.external_for(file_path);
        let mut data = deep_merge(&external, &request.data);

        if !has_title(&data) {
            match std::fs::read_to_string(file_path) {
                Ok(text) => {
                    if let Some(heading) = extract_leading_heading(body_after_fence(&text)) {
                        debug!(id = %request.id, title = %heading.title, "injecting title from heading");
                        data.insert(TITLE_KEY.to_string(), Value::String(heading.title));
                    }
                }
                Err(e) => {
                    debug!(
                        id = %request.id,
                        path = %file_path.display(),
                        "skipping title injection, read failed: {}",
                        e
                    );
                }
            }
        }

        ParseRequest { data, ..request }
    }
}

/// Strip the leading heading from a record about to be stored.
///
/// The body is checked independently of any earlier resolution. The HTML
/// and the heading outline are only touched when the raw body really
/// starts with a `# ` heading.
pub fn finalize(mut request: StoreRequest) -> StoreRequest {
    let Some(extracted) = request.body.as_deref().and_then(extract_leading_heading) else {
        return request;
    };
    request.body = Some(extracted.body);

    if let Some(rendered) = request.rendered.as_mut() {
        rendered.html = strip_rendered_heading(&rendered.html);
        if let Some(metadata) = rendered.metadata.as_mut() {
            if metadata.headings.first().is_some_and(|h| h.level == 1) {
                metadata.headings.remove(0);
            }
        }
    }

    request
}

/// Wrap a parse-metadata callback so it receives resolved metadata.
pub fn intercept_parse_data<F, T>(
    layers: Arc<MetadataLayers>,
    next: F,
) -> impl Fn(ParseRequest) -> T
where
    F: Fn(ParseRequest) -> T,
{
    move |request| next(layers.resolve(request))
}

/// Wrap a store callback so it receives heading-stripped records.
pub fn intercept_store<F, T>(next: F) -> impl Fn(StoreRequest) -> T
where
    F: Fn(StoreRequest) -> T,
{
    move |request| next(finalize(request))
}

/// Only an absent key or an explicit `null` counts as "no title"; an
/// empty string is a title.
fn has_title(data: &MetadataRecord) -> bool {
    !matches!(data.get(TITLE_KEY), None | Some(Value::Null))
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
