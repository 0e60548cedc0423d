//! Core data models used throughout Content Layers.
//!
//! These types represent the metadata records, source mappings, and the
//! request/response shapes exchanged with the discovery, validation, and
//! storage collaborators around the resolution pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One content file's descriptive attributes (title, sidebar hints, flags, ...).
///
/// Arrays are opaque values; only nested objects are ever combined.
pub type MetadataRecord = Map<String, Value>;

/// Relative content path (forward slashes) → metadata record.
///
/// A `BTreeMap` keeps iteration order stable so combining two mappings is
/// deterministic for identical inputs.
pub type SourceMapping = BTreeMap<String, MetadataRecord>;

/// Result of pulling a leading level-1 heading out of a markdown body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingExtraction {
    /// Heading text with inline formatting flattened to plain text.
    pub title: String,
    /// The markdown body with the heading line (and one trailing blank line) removed.
    pub body: String,
}

/// Payload of the "parse metadata" call issued by the discovery collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseRequest {
    pub id: String,
    pub data: MetadataRecord,
    /// Path of the content file as the discovery collaborator sees it.
    /// Without it no external metadata can be located.
    pub file_path: Option<PathBuf>,
}

/// A single entry of the rendered heading outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedHeading {
    /// Heading level, 1 through 6.
    pub level: u8,
    pub slug: String,
    pub text: String,
}

/// Structural metadata produced alongside rendered markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMetadata {
    #[serde(default)]
    pub headings: Vec<RenderedHeading>,
}

/// Output of the rendering collaborator for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RenderedMetadata>,
}

/// Payload of the "finalize stored record" call issued once an entry has
/// been rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub id: String,
    pub data: MetadataRecord,
    pub body: Option<String>,
    pub rendered: Option<Rendered>,
    pub file_path: Option<PathBuf>,
}

/// A fully resolved entry as written by the built-in loader's store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntry {
    pub id: String,
    pub data: MetadataRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<Rendered>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl From<StoreRequest> for StoredEntry {
    fn from(req: StoreRequest) -> Self {
        Self {
            id: req.id,
            data: req.data,
            body: req.body,
            rendered: req.rendered,
            file_path: req.file_path,
        }
    }
}
