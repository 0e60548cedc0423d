use anyhow::{Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sources::SourceOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    /// Glob pattern(s) selecting content files, relative to `base`.
    pub pattern: Patterns,
    #[serde(default = "default_base")]
    pub base: PathBuf,
    /// Centralized metadata file.
    #[serde(default)]
    pub frontmatter: Option<PathBuf>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// One glob or a list of globs.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Patterns::One(p) => vec![p.clone()],
            Patterns::Many(ps) => ps.clone(),
        }
    }
}

fn default_base() -> PathBuf {
    PathBuf::from(".")
}

impl CollectionConfig {
    pub fn new(pattern: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        Self {
            pattern: Patterns::One(pattern.into()),
            base: base.into(),
            frontmatter: None,
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }

    pub fn with_frontmatter(mut self, path: impl Into<PathBuf>) -> Self {
        self.frontmatter = Some(path.into());
        self
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            central_file: self.frontmatter.clone(),
            base: self.base.clone(),
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        let patterns = self.pattern.to_vec();
        if patterns.is_empty() || patterns.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("collections.{}.pattern must not be empty", name);
        }
        for pattern in patterns.iter().chain(&self.exclude_globs) {
            Glob::new(pattern)
                .with_context(|| format!("collections.{}: invalid glob '{}'", name, pattern))?;
        }
        Ok(())
    }
}

impl Config {
    pub fn collection(&self, name: &str) -> Result<&CollectionConfig> {
        self.collections.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.collections.keys().map(String::as_str).collect();
            anyhow::anyhow!(
                "Unknown collection: '{}'. Available: {}",
                name,
                known.join(", ")
            )
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.collections.is_empty() {
        anyhow::bail!("at least one [collections.<name>] table is required");
    }

    for (name, collection) in &config.collections {
        collection.validate(name)?;
    }

    Ok(config)
}
