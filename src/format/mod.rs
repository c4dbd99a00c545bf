//! Output formatters: one record in, one line of text out.
//!
//! The variant is chosen once per run. Every formatter is a pure function
//! of the record and its own settings.

pub mod level;

use crate::search::{HostTimezone, Message};
use colored::Colorize;
use level::{level_label, Severity};

const TAIL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Output mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Tail,
    Dump,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatter {
    /// Human readable line, optionally colored by severity.
    Tail {
        fields: Vec<String>,
        color: bool,
        timezone: HostTimezone,
    },
    /// `;`-separated quoted values, suitable for redirection to a file.
    Dump {
        fields: Vec<String>,
        timezone: HostTimezone,
    },
    /// The raw record, one JSON object per line.
    Json,
}

impl Formatter {
    pub fn new(mode: OutputMode, fields: &[String], color: bool, timezone: HostTimezone) -> Self {
        match mode {
            OutputMode::Tail => Formatter::Tail {
                fields: fields.to_vec(),
                color,
                timezone,
            },
            OutputMode::Dump => Formatter::Dump {
                fields: fields.to_vec(),
                timezone,
            },
            OutputMode::Json => Formatter::Json,
        }
    }

    /// Line printed once before any record.
    pub fn header(&self) -> Option<String> {
        match self {
            Formatter::Dump { fields, .. } => Some(
                std::iter::once("timestamp")
                    .chain(fields.iter().map(String::as_str))
                    .map(quote)
                    .collect::<Vec<_>>()
                    .join(";"),
            ),
            _ => None,
        }
    }

    pub fn format(&self, message: &Message) -> String {
        match self {
            Formatter::Tail {
                fields,
                color,
                timezone,
            } => tail_line(message, fields, *color, *timezone),
            Formatter::Dump { fields, timezone } => dump_line(message, fields, *timezone),
            Formatter::Json => json_line(message),
        }
    }
}

fn timestamp_text(message: &Message, timezone: HostTimezone, pattern: Option<&str>) -> String {
    match message.timestamp() {
        Some(ts) => match pattern {
            Some(p) => timezone.format(&ts, p),
            None => timezone.rfc3339(&ts),
        },
        None => message.text("timestamp").unwrap_or_else(|| "-".to_string()),
    }
}

pub fn tail_line(message: &Message, fields: &[String], color: bool, timezone: HostTimezone) -> String {
    let timestamp = timestamp_text(message, timezone, Some(TAIL_TIMESTAMP_FORMAT));
    let level = level_label(message.get("level"));
    let text = message.text("message").unwrap_or_default();

    let mut line = format!("[{}] {}: {}", timestamp, level, text);

    let extras: Vec<String> = fields
        .iter()
        .filter(|f| f.as_str() != "message" && f.as_str() != "timestamp")
        .map(|f| format!("{}:{}", f, message.text(f).unwrap_or_default()))
        .collect();
    if !extras.is_empty() {
        line.push_str(" # ");
        line.push_str(&extras.join("; "));
    }

    if color {
        if let Some(severity) = message.get("level").and_then(Severity::from_value) {
            return line.color(severity.color()).to_string();
        }
    }
    line
}

pub fn dump_line(message: &Message, fields: &[String], timezone: HostTimezone) -> String {
    let timestamp = timestamp_text(message, timezone, None);
    std::iter::once(quote(&timestamp))
        .chain(
            fields
                .iter()
                .map(|f| quote(&message.text(f).unwrap_or_default())),
        )
        .collect::<Vec<_>>()
        .join(";")
}

pub fn json_line(message: &Message) -> String {
    serde_json::Value::Object(message.fields().clone()).to_string()
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
