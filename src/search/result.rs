//! Search results as delivered by a backend.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One log record: an opaque field name to value mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    fields: Map<String, Value>,
}

impl Message {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value as display text; strings are unquoted, `null` is absent.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The record's `timestamp` field, if it parses as RFC 3339.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.fields.get("timestamp")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Aggregated outcome of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Newest first, as the backend delivers them.
    pub messages: Vec<Message>,
    /// Exclusive upper instant up to which the result is complete. Never
    /// later than the query's resolved `to`.
    pub range_to: DateTime<Utc>,
    pub total_results: Option<u64>,
}

impl SearchResult {
    pub fn empty(range_to: DateTime<Utc>) -> Self {
        Self {
            messages: Vec::new(),
            range_to,
            total_results: Some(0),
        }
    }

    /// Matches the backend counted but did not deliver.
    pub fn omitted(&self) -> u64 {
        self.total_results
            .map_or(0, |t| t.saturating_sub(self.messages.len() as u64))
    }
}
