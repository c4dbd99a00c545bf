//! Command-line interface for graytail.
//!
//! Argument model (clap derive) and the translation of arguments plus config
//! into a connection and a query.

pub mod resolve;

use crate::format::OutputMode;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Upper bound for `--latency`, one day.
pub const MAX_LATENCY_SECS: u64 = 86_400;

#[derive(Parser, Debug)]
#[command(name = "graytail", version)]
#[command(about = "A Graylog command-line client with gap-free live tail", long_about = None)]
#[command(group(ArgGroup::new("mode").args(["tail", "dump", "json"])))]
pub struct Args {
    /// Search query, or `:name` to run a stored query from the config file.
    /// A query that is literally `config` must follow `--`
    #[arg(value_name = "QUERY", default_value = "*")]
    pub query: String,

    /// Label of a preconfigured Graylog node
    #[arg(long)]
    pub node: Option<String>,

    /// Your Graylog node's host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Use TLS
    #[arg(long)]
    pub tls: bool,

    /// Graylog API port
    #[arg(long, default_value_t = 12900)]
    pub port: u16,

    /// Graylog API endpoint, e.g. /api
    #[arg(long, default_value = "/")]
    pub endpoint: String,

    /// Graylog username (default: node config, then $USER)
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Graylog password (default: $GRAYTAIL_PASSWORD, then node config)
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Query range from
    #[arg(short = '@', long = "search-from", default_value = "5 minutes ago")]
    pub search_from: String,

    /// Query range to (default: now)
    #[arg(short = '#', long = "search-to")]
    pub search_to: Option<String>,

    /// Show the last n lines for the query (default)
    #[arg(short = 't', long)]
    pub tail: bool,

    /// Print the query result as `;`-separated quoted values
    #[arg(short = 'd', long)]
    pub dump: bool,

    /// Print the raw JSON log objects, one per line
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Poll the server for new messages (ignores limit and sort)
    #[arg(short = 'f', long)]
    pub follow: bool,

    /// Polling interval in milliseconds
    #[arg(short = 'l', long, default_value_t = 1000)]
    pub interval: u64,

    /// Limit the number of results (0 or less: no limit)
    #[arg(short = 'n', long, default_value_t = 10, allow_negative_numbers = true)]
    pub limit: i64,

    /// Seconds the server may need to index a message
    #[arg(
        short = 'a',
        long,
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(..=MAX_LATENCY_SECS)
    )]
    pub latency: u64,

    /// Stream ID to restrict the query to
    #[arg(short = 'r', long)]
    pub stream: Option<String>,

    /// Fields to include in the output (repeatable)
    #[arg(short = 'e', long = "field", default_value = "message")]
    pub fields: Vec<String>,

    /// Template values for a stored query, as name=value (repeatable)
    #[arg(short = 'x', long = "template-option")]
    pub template_options: Vec<String>,

    /// Field used for sorting
    #[arg(short = 's', long)]
    pub sort: Option<String>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Color tail output by log level
    #[arg(long)]
    pub color: bool,

    /// Proxy for the HTTP(S) requests
    #[arg(long)]
    pub proxy: Option<String>,

    /// Failed follow cycles tolerated in a row before giving up
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Config file to use instead of the discovered one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Args {
    pub fn mode(&self) -> OutputMode {
        if self.dump {
            OutputMode::Dump
        } else if self.json {
            OutputMode::Json
        } else {
            OutputMode::Tail
        }
    }
}

/// Available subcommands for graytail.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Config file commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the config file
    Validate,
    /// Show effective configuration
    Show,
}
