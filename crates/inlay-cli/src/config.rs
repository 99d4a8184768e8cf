//! `inlay.toml` loading.

use std::fs;
use std::path::Path;

use inlay_rewrite::RewriteConfig;
use serde::Deserialize;

/// Settings read from a TOML file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub rewrite: RewriteConfig,
}

impl CliConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given, then apply command-line overrides.
    pub fn resolve(path: Option<&Path>, max_depth: Option<usize>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(depth) = max_depth {
            config.rewrite = config.rewrite.with_max_inline_depth(depth);
        }
        Ok(config)
    }
}
