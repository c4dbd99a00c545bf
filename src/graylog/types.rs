//! Wire types of the Graylog REST API, only the parts this client reads.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Body of `GET /search/universal/absolute`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub messages: Vec<MessageEnvelope>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// One hit; `message` holds the record's fields.
#[derive(Debug, Deserialize)]
pub struct MessageEnvelope {
    pub message: Map<String, Value>,
    #[serde(default)]
    pub index: Option<String>,
}

/// Body of `GET /system`.
#[derive(Debug, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}
