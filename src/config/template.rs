//! `${name}` substitution in stored queries.

use crate::config::error::{suggest, ConfigError};
use crate::config::types::StoredQuery;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

/// Parse `-x name=value` options. The value may itself contain `=`.
pub fn parse_options(options: &[String]) -> Result<HashMap<String, String>, ConfigError> {
    options
        .iter()
        .map(|opt| {
            opt.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "template option `{}` is not of the form name=value",
                        opt
                    ))
                })
        })
        .collect()
}

/// Substitute every placeholder in `template`.
pub fn render(template: &str, values: &HashMap<String, String>) -> Result<String, ConfigError> {
    let re = placeholder_regex();
    if let Some(missing) = re
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| !values.contains_key(name))
    {
        return Err(ConfigError::Template {
            suggestion: suggest(&missing, values.keys().map(String::as_str)),
            placeholder: missing,
        });
    }

    Ok(re
        .replace_all(template, |caps: &Captures| values[&caps[1]].clone())
        .into_owned())
}

impl StoredQuery {
    /// Copy with every string value rendered.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<StoredQuery, ConfigError> {
        let opt = |s: &Option<String>| s.as_deref().map(|s| render(s, values)).transpose();
        Ok(StoredQuery {
            query: render(&self.query, values)?,
            limit: self.limit,
            from: opt(&self.from)?,
            to: opt(&self.to)?,
            sort: opt(&self.sort)?,
            ascending: self.ascending,
            fields: self
                .fields
                .as_ref()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|f| render(f, values))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?,
            stream: opt(&self.stream)?,
        })
    }
}
