//! # Content Layers CLI (`layers`)
//!
//! Resolves the metadata of a configured content collection and prints it,
//! or lists the metadata source documents a dev server would watch.
//!
//! ## Usage
//!
//! ```bash
//! layers --config ./config/layers.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `layers resolve <collection>` | Print every resolved entry as JSON |
//! | `layers sources <collection>` | List centralized and per-directory metadata files |
//!
//! Set `RUST_LOG=debug` to trace which metadata documents are read and
//! which titles are inferred.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use content_layers::config;
use content_layers::loader::{load_collection, LoadHooks};
use content_layers::sources::collect_source_document_paths;

/// Content Layers CLI — layered metadata resolution for markdown collections.
#[derive(Parser)]
#[command(
    name = "layers",
    about = "Content Layers — layered metadata resolution for markdown collections",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/layers.toml`. Each `[collections.<name>]`
    /// table names a pattern, a base directory, and an optional
    /// centralized metadata file.
    #[arg(long, global = true, default_value = "./config/layers.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve every entry of a collection and print the result as JSON.
    ///
    /// Merges centralized and per-directory metadata beneath each file's
    /// frontmatter, infers missing titles from a leading `# ` heading, and
    /// strips that heading from the printed body.
    Resolve {
        /// Collection name from the config file.
        collection: String,
    },

    /// List the metadata source documents of a collection.
    ///
    /// Prints the centralized file (if it exists) followed by every
    /// per-directory `_meta` document, one path per line.
    Sources {
        /// Collection name from the config file.
        collection: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Resolve { collection } => {
            let collection = cfg.collection(&collection)?;
            let entries = load_collection(collection, LoadHooks::default())?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Sources { collection } => {
            let collection = cfg.collection(&collection)?;
            for path in collect_source_document_paths(&collection.source_options()) {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
