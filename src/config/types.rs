//! Config types for graytail.
//!
//! Raw structs mirror the YAML file; validated structs carry defaults
//! applied and names attached.

use crate::config::error::{suggest, ConfigError};
use crate::search::HostTimezone;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 12900;
pub const DEFAULT_ENDPOINT: &str = "/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw config file structure (used for parsing).
///
/// Unknown fields are rejected with an error.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Node used when neither `--node` nor `--host` is given.
    pub default_node: Option<String>,
    #[serde(default)]
    pub nodes: BTreeMap<String, RawNode>,
    #[serde(default)]
    pub queries: BTreeMap<String, StoredQuery>,
}

/// Raw Graylog node entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawNode {
    pub host: String,
    pub port: Option<u16>,
    pub endpoint: Option<String>,
    pub tls: Option<bool>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timezone: Option<String>,
    pub proxy: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Stored query; string values may contain `${name}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredQuery {
    pub query: String,
    pub limit: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<String>,
    pub ascending: Option<bool>,
    pub fields: Option<Vec<String>>,
    pub stream: Option<String>,
}

/// Validated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub endpoint: String,
    pub tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Explicit zone; `None` means ask the server.
    pub timezone: Option<HostTimezone>,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl Node {
    pub fn from_raw(name: &str, raw: RawNode, path: &std::path::Path) -> Result<Self, ConfigError> {
        let timezone = match raw.timezone.as_deref() {
            None => None,
            Some(tz) => {
                let parsed: HostTimezone = tz.parse().map_err(|e| ConfigError::Validation {
                    path: path.to_path_buf(),
                    message: format!("node `{}`: {}", name, e),
                })?;
                // The default zone is treated as unset so the server is asked
                if parsed == HostTimezone::Utc {
                    None
                } else {
                    Some(parsed)
                }
            }
        };

        Ok(Self {
            name: name.to_string(),
            host: raw.host,
            port: raw.port.unwrap_or(DEFAULT_PORT),
            endpoint: raw.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            tls: raw.tls.unwrap_or(false),
            username: raw.username,
            password: raw.password,
            timezone,
            proxy: raw.proxy,
            timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

/// Effective configuration (closest config file wins, no merge).
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File this config was loaded from, if any.
    pub path: Option<PathBuf>,
    pub default_node: Option<String>,
    pub nodes: BTreeMap<String, Node>,
    pub queries: BTreeMap<String, StoredQuery>,
}

impl Config {
    pub fn node(&self, name: &str) -> Result<&Node, ConfigError> {
        self.nodes.get(name).ok_or_else(|| ConfigError::UnknownName {
            kind: "node",
            name: name.to_string(),
            suggestion: suggest(name, self.nodes.keys().map(String::as_str)),
        })
    }

    pub fn default_node(&self) -> Option<&Node> {
        self.default_node
            .as_deref()
            .and_then(|name| self.nodes.get(name))
    }

    pub fn query(&self, name: &str) -> Result<&StoredQuery, ConfigError> {
        self.queries.get(name).ok_or_else(|| ConfigError::UnknownName {
            kind: "stored query",
            name: name.to_string(),
            suggestion: suggest(name, self.queries.keys().map(String::as_str)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn raw(host: &str) -> RawNode {
        RawNode {
            host: host.into(),
            port: None,
            endpoint: None,
            tls: None,
            username: None,
            password: None,
            timezone: None,
            proxy: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_node_defaults() {
        let node = Node::from_raw("prod", raw("gl.example.com"), Path::new("x.yaml")).unwrap();
        assert_eq!(node.port, DEFAULT_PORT);
        assert_eq!(node.endpoint, "/");
        assert!(!node.tls);
        assert_eq!(node.timezone, None);
        assert_eq!(node.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_node_timezone() {
        let mut r = raw("h");
        r.timezone = Some("+02:00".into());
        let node = Node::from_raw("n", r, Path::new("x.yaml")).unwrap();
        assert!(matches!(node.timezone, Some(HostTimezone::Fixed(_))));

        let mut r = raw("h");
        r.timezone = Some("America/New_York".into());
        let node = Node::from_raw("n", r, Path::new("x.yaml")).unwrap();
        assert!(matches!(node.timezone, Some(HostTimezone::Named(_))));

        let mut r = raw("h");
        r.timezone = Some("UTC".into());
        assert_eq!(Node::from_raw("n", r, Path::new("x.yaml")).unwrap().timezone, None);

        let mut r = raw("h");
        r.timezone = Some("Mars/Olympus".into());
        assert!(matches!(
            Node::from_raw("n", r, Path::new("x.yaml")),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_node_suggests() {
        let mut config = Config::default();
        let node = Node::from_raw("production", raw("h"), Path::new("x.yaml")).unwrap();
        config.nodes.insert("production".into(), node);

        match config.node("prodution") {
            Err(ConfigError::UnknownName { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("production"))
            }
            other => panic!("Expected UnknownName, got: {:?}", other),
        }
        assert!(config.default_node().is_none());
    }
}
