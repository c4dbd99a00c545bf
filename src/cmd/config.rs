//! Config validate and show commands for graytail.

use crate::config::{self, Config, Node};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Explicit `--config` path, else the closest discovered file.
fn effective_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| config::discover().effective())
}

/// Validate the effective config file.
///
/// Follows Unix conventions:
/// - Exit 0 with no output on success (quiet success)
/// - Exit 1 with error message to stderr on failure
pub fn validate(explicit: Option<&Path>) -> Result<(), i32> {
    let config_path = match effective_config_path(explicit) {
        Some(path) => path,
        None => {
            eprintln!("error: No config found to validate");
            return Err(1);
        }
    };

    match config::load_file_config(&config_path) {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{}", e);
            Err(1)
        }
    }
}

/// Show the effective configuration. Passwords are never printed.
///
/// Respects NO_COLOR environment variable via the colored crate.
pub fn show(explicit: Option<&Path>) -> Result<(), i32> {
    match effective_config_path(explicit) {
        Some(path) => match config::load_file_config(&path) {
            Ok(cfg) => {
                println!("Using: {}", path.display().to_string().dimmed());
                println!();
                show_config(&cfg);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e);
                Err(1)
            }
        },
        None => {
            println!("{}", "No config found. Using defaults.".dimmed());
            println!();
            println!("{}", "(no nodes defined)".dimmed());
            Ok(())
        }
    }
}

fn show_config(cfg: &Config) {
    match &cfg.default_node {
        Some(name) => println!("{}: {}", "default_node".cyan(), name.green()),
        None => println!("{}: {}", "default_node".cyan(), "(not set)".dimmed()),
    }

    println!();
    if cfg.nodes.is_empty() {
        println!("{}", "(no nodes defined)".dimmed());
    } else {
        println!("{}:", "nodes".cyan());
        for node in cfg.nodes.values() {
            show_node(node);
        }
    }

    if !cfg.queries.is_empty() {
        println!();
        println!("{}:", "queries".cyan());
        for (name, query) in &cfg.queries {
            println!("  - {}: {}", "name".blue(), name.green());
            println!("    {}: {}", "query".blue(), query.query.yellow());
        }
    }
}

fn show_node(node: &Node) {
    let scheme = if node.tls { "https" } else { "http" };
    println!("  - {}: {}", "name".blue(), node.name.green());
    println!(
        "    {}: {}",
        "url".blue(),
        format!("{}://{}:{}{}", scheme, node.host, node.port, node.endpoint).yellow()
    );
    if let Some(user) = &node.username {
        println!("    {}: {}", "username".blue(), user);
    }
    if node.password.is_some() {
        println!("    {}: {}", "password".blue(), "(set)".dimmed());
    }
    let tz = node
        .timezone
        .map(|tz| tz.to_string())
        .unwrap_or_else(|| "(from server)".to_string());
    println!("    {}: {}", "timezone".blue(), tz);
}
