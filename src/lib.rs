//! # Content Layers
//!
//! Layered metadata resolution and title inference for markdown content
//! collections.
//!
//! Each content file's final metadata is assembled from up to four
//! sources, lowest precedence first: a centralized metadata file,
//! per-directory `_meta` documents, the file's own frontmatter, and, when
//! nothing else sets a `title`, the file's leading `# ` heading. Once the
//! entry is rendered, that heading is removed from the body, the HTML, and
//! the heading outline so it is not printed twice.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ meta.yml     │──▶│  Authoritative│◀──│ _meta.yml    │
//! │ (central)    │   │   mapping     │   │ (per dir)    │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           ▼
//!  glob loader ──▶ resolve (merge + title) ──▶ validator
//!                           │
//!                 renderer ─┴─▶ finalize (strip heading) ──▶ store
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! layers resolve docs           # print resolved entries as JSON
//! layers sources docs           # list metadata source documents
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`merge`] | Recursive record merge |
//! | [`heading`] | Leading heading extraction and HTML stripping |
//! | [`frontmatter`] | Metadata fence handling |
//! | [`sources`] | Centralized and per-directory metadata sources |
//! | [`layers`] | Per-file resolution and finalize interception |
//! | [`traits`] | Validator, renderer, and watcher seams |
//! | [`loader`] | Built-in glob loader |

pub mod config;
pub mod frontmatter;
pub mod heading;
pub mod layers;
pub mod loader;
pub mod merge;
pub mod models;
pub mod sources;
pub mod traits;
