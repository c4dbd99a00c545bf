//! Config loading for graytail.
//!
//! Loads and validates the YAML config file. Closest config wins completely;
//! project and global files are never merged.

use std::fs;
use std::path::Path;

use crate::config::discovery::DiscoveryResult;
use crate::config::error::{suggest, ConfigError};
use crate::config::types::{Config, Node, RawConfig};

/// True when the file holds nothing but blank lines and comments.
fn is_blank_yaml(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#') || l == "---")
}

/// Load and parse a YAML config file.
fn load_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if is_blank_yaml(&content) {
        return Ok(RawConfig::default());
    }

    serde_saphyr::from_str(&content)
        .map_err(|e| ConfigError::parse(path.to_path_buf(), e.to_string()))
}

fn validate(path: &Path, raw: RawConfig) -> Result<Config, ConfigError> {
    let mut nodes = std::collections::BTreeMap::new();
    for (name, raw_node) in raw.nodes {
        let node = Node::from_raw(&name, raw_node, path)?;
        nodes.insert(name, node);
    }

    if let Some(default) = &raw.default_node {
        if !nodes.contains_key(default) {
            let hint = suggest(default, nodes.keys().map(String::as_str))
                .map(|s| format!(" (did you mean `{}`?)", s))
                .unwrap_or_default();
            return Err(ConfigError::Validation {
                path: path.to_path_buf(),
                message: format!("default_node `{}` is not defined{}", default, hint),
            });
        }
    }

    for (name, query) in &raw.queries {
        if query.query.trim().is_empty() {
            return Err(ConfigError::Validation {
                path: path.to_path_buf(),
                message: format!("stored query `{}` has an empty query", name),
            });
        }
    }

    Ok(Config {
        path: Some(path.to_path_buf()),
        default_node: raw.default_node,
        nodes,
        queries: raw.queries,
    })
}

/// Load and validate a single config file.
pub fn load_file_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = load_file(path)?;
    validate(path, raw)
}

/// Load the effective config from discovered files.
///
/// Returns an empty Config if no config files exist (graceful degradation).
pub fn load(discovery: &DiscoveryResult) -> Result<Config, ConfigError> {
    match discovery.effective() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_file_config(&path)
        }
        None => Ok(Config::default()),
    }
}
