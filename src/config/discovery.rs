//! Locating the config file.
//!
//! A `graytail.yaml` in the working directory or any ancestor takes
//! precedence over the per-user file `<config dir>/graytail/config.yaml`.

use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_NAME: &str = "graytail.yaml";

const USER_CONFIG_DIR: &str = "graytail";
const USER_CONFIG_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    pub project_config: Option<PathBuf>,
    pub global_config: Option<PathBuf>,
}

impl DiscoveryResult {
    pub fn has_config(&self) -> bool {
        self.project_config.is_some() || self.global_config.is_some()
    }

    /// The file that will be loaded. Files are never merged.
    pub fn effective(&self) -> Option<PathBuf> {
        self.project_config
            .as_ref()
            .or(self.global_config.as_ref())
            .cloned()
    }
}

fn is_file(path: &Path) -> bool {
    path.try_exists().unwrap_or(false) && path.is_file()
}

/// Nearest `graytail.yaml` at or above `start`.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_NAME))
        .find(|candidate| is_file(candidate))
}

/// User config inside `config_dir`, if present.
pub fn find_global_config(config_dir: &Path) -> Option<PathBuf> {
    let path = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_NAME);
    is_file(&path).then_some(path)
}

/// Discovery rooted at an explicit directory and user config dir.
pub fn discover_from(start: &Path, config_dir: Option<&Path>) -> DiscoveryResult {
    let result = DiscoveryResult {
        project_config: find_project_config(start),
        global_config: config_dir.and_then(find_global_config),
    };
    tracing::debug!(
        start = %start.display(),
        project = ?result.project_config,
        global = ?result.global_config,
        "config discovery"
    );
    result
}

/// Discovery from the current working directory.
pub fn discover() -> DiscoveryResult {
    let config_dir = dirs::config_dir();
    match std::env::current_dir() {
        Ok(cwd) => {
            let cwd = cwd.canonicalize().unwrap_or(cwd);
            discover_from(&cwd, config_dir.as_deref())
        }
        Err(_) => DiscoveryResult {
            project_config: None,
            global_config: config_dir.as_deref().and_then(find_global_config),
        },
    }
}
