//! Syslog severities carried in the `level` field.

use colored::Color;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    pub fn from_number(level: u64) -> Option<Self> {
        Some(match level {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            7 => Severity::Debug,
            _ => return None,
        })
    }

    /// Maps numeric levels and common level names. Case-insensitive.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(Self::from_number),
            Value::String(s) => {
                if let Ok(n) = s.trim().parse::<u64>() {
                    return Self::from_number(n);
                }
                match s.trim().to_ascii_lowercase().as_str() {
                    "emerg" | "emergency" | "panic" => Some(Severity::Emergency),
                    "alert" => Some(Severity::Alert),
                    "crit" | "critical" | "fatal" => Some(Severity::Critical),
                    "err" | "error" => Some(Severity::Error),
                    "warn" | "warning" => Some(Severity::Warning),
                    "notice" => Some(Severity::Notice),
                    "info" | "informational" => Some(Severity::Info),
                    "debug" | "trace" => Some(Severity::Debug),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                Color::Red
            }
            Severity::Warning => Color::Yellow,
            Severity::Notice => Color::Cyan,
            Severity::Info => Color::Green,
            Severity::Debug => Color::Blue,
        }
    }
}

/// Label shown in tail output: syslog name, raw text upper-cased, or `-`.
pub fn level_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(v) => match Severity::from_value(v) {
            Some(severity) => severity.name().to_string(),
            None => match v {
                Value::String(s) => s.to_uppercase(),
                other => other.to_string(),
            },
        },
    }
}
