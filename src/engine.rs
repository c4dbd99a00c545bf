//! Single-shot search and the follow loop.
//!
//! A follow cycle is QUERYING → PRINTING → WAITING. Each cycle's window
//! starts exactly at the previous result's `range_to` and ends `latency`
//! seconds before issuance, so windows tile the timeline with no gap and
//! no overlap. Cancellation is observed only between cycles and while
//! waiting; an in-flight search always completes and is printed.

use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::format::Formatter;
use crate::search::{Message, SearchBackend, SearchError, SearchQuery, SearchRange, SearchResult};
use std::io::{self, Write};
use std::time::Duration;

/// Printed to the error stream when follow mode is interrupted.
pub const INTERRUPT_NOTICE: &str = "\nInterrupted follow mode. Exiting...";

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl EngineError {
    /// The reader of our output went away, e.g. `graytail -f | head`.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, EngineError::Output(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

/// How many failed cycles in a row follow mode tolerates.
///
/// The default of zero ends the run on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowOptions {
    /// Pause between cycles.
    pub interval: Duration,
    /// Seconds subtracted from "now" for each window's upper bound.
    pub latency: u64,
    pub retry: RetryPolicy,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            latency: 2,
            retry: RetryPolicy::default(),
        }
    }
}

/// Totals reported when follow mode stops gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowOutcome {
    pub cycles: u64,
    pub messages: u64,
}

/// Write a batch oldest first. `oldest_first` tells whether the backend
/// already delivered it that way; otherwise it arrived newest first.
pub fn print_batch<W: Write>(
    result: &SearchResult,
    oldest_first: bool,
    formatter: &Formatter,
    out: &mut W,
) -> io::Result<usize> {
    let messages: Box<dyn Iterator<Item = &Message> + '_> = if oldest_first {
        Box::new(result.messages.iter())
    } else {
        Box::new(result.messages.iter().rev())
    };
    for message in messages {
        writeln!(out, "{}", formatter.format(message))?;
    }
    Ok(result.messages.len())
}

pub struct TailEngine<B, C> {
    backend: B,
    clock: C,
    formatter: Formatter,
}

impl<B: SearchBackend, C: Clock> TailEngine<B, C> {
    pub fn new(backend: B, clock: C, formatter: Formatter) -> Self {
        Self {
            backend,
            clock,
            formatter,
        }
    }

    fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(header) = self.formatter.header() {
            writeln!(out, "{}", header)?;
        }
        Ok(())
    }

    /// One query, printed in chronological order.
    fn cycle<W: Write>(&self, query: &SearchQuery, out: &mut W) -> Result<SearchResult, EngineError> {
        let result = self.backend.search(query, self.clock.now())?;
        print_batch(&result, query.oldest_first(), &self.formatter, out)?;
        out.flush()?;
        Ok(result)
    }

    /// Run `query` once and print the result.
    pub fn run_once<W: Write>(
        &self,
        query: &SearchQuery,
        out: &mut W,
    ) -> Result<SearchResult, EngineError> {
        self.write_header(out)?;
        self.cycle(query, out)
    }

    /// Poll until `cancel` fires or a search fails beyond the retry budget.
    ///
    /// Limit and sort of `query` are dropped and its range is replaced by
    /// the follow window; every other attribute is carried into each cycle.
    pub fn follow<W: Write, E: Write>(
        &self,
        query: &SearchQuery,
        options: &FollowOptions,
        cancel: &CancelToken,
        out: &mut W,
        err: &mut E,
    ) -> Result<FollowOutcome, EngineError> {
        let mut outcome = FollowOutcome::default();
        let mut failures = 0u32;
        let mut next = query.for_follow(SearchRange::initial_follow(options.latency));

        self.write_header(out)?;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let current = next;
            match self.cycle(&current, out) {
                Ok(result) => {
                    failures = 0;
                    outcome.cycles += 1;
                    outcome.messages += result.messages.len() as u64;
                    tracing::debug!(
                        cycle = outcome.cycles,
                        messages = result.messages.len(),
                        range_to = %result.range_to,
                        "follow cycle complete"
                    );
                    let omitted = result.omitted();
                    if omitted > 0 {
                        writeln!(
                            err,
                            "warning: page limit reached, {} messages up to {} were not retrieved",
                            omitted, result.range_to
                        )?;
                    }
                    next = current.with_range(SearchRange::since(result.range_to, options.latency));
                }
                Err(EngineError::Search(e)) => {
                    failures += 1;
                    if failures > options.retry.max_consecutive_failures {
                        return Err(e.into());
                    }
                    tracing::debug!(failures, error = %e, "follow cycle failed, keeping window");
                    writeln!(
                        err,
                        "warning: {} (retry {}/{})",
                        e, failures, options.retry.max_consecutive_failures
                    )?;
                    // Same window again, nothing skipped
                    next = current;
                }
                Err(e) => return Err(e),
            }

            if !self.clock.sleep_unless_cancelled(options.interval, cancel) {
                break;
            }
        }

        writeln!(err, "{}", INTERRUPT_NOTICE)?;
        Ok(outcome)
    }
}
