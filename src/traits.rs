//! Collaborator seams around the resolution pipeline.
//!
//! Content Layers does not validate schemas, render markdown, or watch
//! files itself. The built-in loader reaches those concerns through the
//! traits below so a host application can plug in its own.
//!
//! ```text
//!   discovery ──▶ parse metadata ──▶ MetadataValidator
//!                      │
//!                      ▼
//!                  Renderer ──▶ finalize ──▶ store
//!
//!   PathWatcher ◀── metadata source documents (once per load cycle)
//! ```

use anyhow::Result;
use std::path::PathBuf;

use crate::models::{MetadataRecord, ParseRequest, Rendered};

// ═══════════════════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════════════════

/// Schema validation applied to each entry's final metadata.
///
/// Receives the record after external metadata has been merged in and a
/// title has possibly been injected. Returning an error aborts the load.
pub trait MetadataValidator: Send + Sync {
    fn validate(&self, request: ParseRequest) -> Result<MetadataRecord>;
}

/// Any matching closure is a validator.
impl<F> MetadataValidator for F
where
    F: Fn(ParseRequest) -> Result<MetadataRecord> + Send + Sync,
{
    fn validate(&self, request: ParseRequest) -> Result<MetadataRecord> {
        self(request)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════════════════

/// Turns a markdown body into HTML plus its heading outline.
pub trait Renderer: Send + Sync {
    fn render(&self, body: &str) -> Result<Rendered>;
}

// ═══════════════════════════════════════════════════════════════════════
// Watching
// ═══════════════════════════════════════════════════════════════════════

/// Dev-session file watcher. Only ever asked to add paths.
pub trait PathWatcher: Send + Sync {
    /// Add absolute file paths to the watch set.
    fn add_paths(&self, paths: &[PathBuf]);
}
