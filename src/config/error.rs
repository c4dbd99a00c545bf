//! Config error types for graytail.
//!
//! Provides rich error messages with file locations and typo suggestions.

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Error loading, validating or applying configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading the config file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parse error.
    Parse {
        path: PathBuf,
        message: String,
        suggestion: Option<String>,
    },

    /// Semantic error in an otherwise well-formed file.
    Validation { path: PathBuf, message: String },

    /// A node or stored query name that is not defined.
    UnknownName {
        kind: &'static str,
        name: String,
        suggestion: Option<String>,
    },

    /// A `${name}` placeholder without a value.
    Template {
        placeholder: String,
        suggestion: Option<String>,
    },

    /// Required setting absent or malformed on the command line.
    Invalid(String),
}

/// Closest candidate to `name`, if any is close enough to be a typo.
pub fn suggest<'a, I>(name: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|c| (strsim::jaro_winkler(name, c), c))
        .filter(|(score, _)| *score > 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

fn unknown_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"unknown field `([^`]+)`, expected (.*)").expect("unknown field regex is valid")
    })
}

impl ConfigError {
    /// Build a parse error, deriving a suggestion from serde's unknown
    /// field message when there is one.
    pub fn parse(path: PathBuf, message: String) -> Self {
        let suggestion = unknown_field_regex().captures(&message).and_then(|caps| {
            let expected: Vec<&str> = caps
                .get(2)
                .map(|m| m.as_str().split('`').skip(1).step_by(2).collect())
                .unwrap_or_default();
            suggest(&caps[1], expected)
        });
        ConfigError::Parse {
            path,
            message,
            suggestion,
        }
    }

    /// Format error in Cargo-style format.
    pub fn format_cargo_style(&self) -> String {
        match self {
            ConfigError::Io { path, source } => {
                format!(
                    "error: cannot read config file\n  --> {}\n  |\n  = {}\n",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse {
                path,
                message,
                suggestion,
            } => {
                let mut output = format!("error: {}\n  --> {}\n  |\n", message, path.display());
                if let Some(suggestion) = suggestion {
                    output.push_str(&format!("  = help: did you mean `{}`?\n", suggestion));
                }
                output
            }
            ConfigError::Validation { path, message } => {
                format!("error: {}\n  --> {}\n  |\n", message, path.display())
            }
            ConfigError::UnknownName {
                kind,
                name,
                suggestion,
            } => {
                let mut output = format!("error: unknown {} `{}`\n", kind, name);
                if let Some(suggestion) = suggestion {
                    output.push_str(&format!("  = help: did you mean `{}`?\n", suggestion));
                }
                output
            }
            ConfigError::Template {
                placeholder,
                suggestion,
            } => {
                let mut output = format!(
                    "error: no value for template placeholder `${{{}}}`\n  = help: pass -x {}=<value>\n",
                    placeholder, placeholder
                );
                if let Some(suggestion) = suggestion {
                    output.push_str(&format!("  = help: did you mean `{}`?\n", suggestion));
                }
                output
            }
            ConfigError::Invalid(message) => format!("error: {}\n", message),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_cargo_style().trim_end())
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
