use anyhow::{Context, Result};
use clap::Parser;
use graytail::cli::resolve::{self, Env};
use graytail::cli::{Args, Commands, ConfigAction};
use graytail::clock::SystemClock;
use graytail::config::{self, ConfigError};
use graytail::engine::{EngineError, FollowOptions, RetryPolicy, TailEngine};
use graytail::format::Formatter;
use graytail::graylog::GraylogClient;
use graytail::search::HostTimezone;
use graytail::{cmd, logging, signal};
use std::io;
use std::time::Duration;

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Some(Commands::Config { action }) = &args.command {
        let result = match action {
            ConfigAction::Validate => cmd::config::validate(args.config.as_deref()),
            ConfigAction::Show => cmd::config::show(args.config.as_deref()),
        };
        if let Err(code) = result {
            std::process::exit(code);
        }
        return;
    }

    if let Err(err) = run(&args) {
        // Output closed by the reader, e.g. `graytail -f | head`
        if err
            .downcast_ref::<EngineError>()
            .is_some_and(EngineError::is_broken_pipe)
        {
            return;
        }
        match err.downcast_ref::<ConfigError>() {
            // Already rendered Cargo-style
            Some(config_err) => eprintln!("{}", config_err),
            None => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }
}

/// Ask the server for its timezone, falling back to UTC with a warning.
fn discover_timezone(client: &GraylogClient) -> HostTimezone {
    match client.host_timezone() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::debug!(error = %e, "timezone discovery failed");
            let fallback = HostTimezone::default();
            eprintln!("Unable to retrieve timezone from server");
            eprintln!("Using default timezone: {}", fallback);
            fallback
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => config::load_file_config(path)?,
        None => config::load(&config::discover())?,
    };

    let target = resolve::resolve_target(args, &config, &Env::from_process())?;
    let client = GraylogClient::new(&target.connection)
        .with_context(|| format!("cannot connect to {}", target.connection.base_url()))?;

    let timezone = match target.timezone {
        Some(tz) => tz,
        None => discover_timezone(&client),
    };

    let resolved = resolve::resolve_query(args, &config, timezone)?;
    let formatter = Formatter::new(args.mode(), &resolved.fields, args.color, timezone);
    tracing::debug!(server = %client, query = ?resolved.query, "starting");

    let engine = TailEngine::new(client, SystemClock, formatter);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.follow {
        let cancel = signal::setup_shutdown_handlers()
            .context("Failed to set signal handlers")?;
        let options = FollowOptions {
            interval: Duration::from_millis(args.interval),
            latency: args.latency,
            retry: RetryPolicy {
                max_consecutive_failures: args.retries,
            },
        };
        let outcome = engine.follow(
            &resolved.query,
            &options,
            &cancel,
            &mut out,
            &mut io::stderr(),
        )?;
        tracing::debug!(cycles = outcome.cycles, messages = outcome.messages, "follow stopped");
    } else {
        let result = engine.run_once(&resolved.query, &mut out)?;
        if resolved.query.limit().is_none() && result.omitted() > 0 {
            eprintln!(
                "warning: page limit reached, {} messages were not retrieved",
                result.omitted()
            );
        }
    }

    Ok(())
}
