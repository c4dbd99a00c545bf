//! Half-open time windows `[from, to)`.

use super::time::{HostTimezone, TimeParseError, TimeSpec};
use chrono::{DateTime, TimeDelta, Utc};

/// Immutable search window.
///
/// `from` is inclusive, `to` is exclusive. An unset `to` means "now at the
/// time the query is issued". Bounds are resolved only when a query is
/// handed to a backend, see [`SearchRange::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    from: TimeSpec,
    to: Option<TimeSpec>,
}

/// A range with both bounds pinned to absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ResolvedRange {
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.from && *instant < self.to
    }
}

fn latency_seconds(latency: u64) -> i64 {
    i64::try_from(latency).unwrap_or(i64::MAX)
}

impl SearchRange {
    pub fn new(from: TimeSpec, to: Option<TimeSpec>) -> Self {
        Self { from, to }
    }

    /// Build a range from user supplied expressions.
    pub fn parse(
        from: &str,
        to: Option<&str>,
        tz: HostTimezone,
    ) -> Result<Self, TimeParseError> {
        let from = TimeSpec::parse(from, tz)?;
        let to = to.map(|t| TimeSpec::parse(t, tz)).transpose()?;
        Ok(Self::new(from, to))
    }

    /// Window for the first follow cycle: the one second ending `latency`
    /// seconds before issuance.
    pub fn initial_follow(latency: u64) -> Self {
        Self::new(TimeSpec::Relative(TimeDelta::seconds(-1)), None).shift(-latency_seconds(latency))
    }

    /// Window starting exactly at `from` and ending `latency` seconds before
    /// issuance.
    pub fn since(from: DateTime<Utc>, latency: u64) -> Self {
        Self::new(
            TimeSpec::Absolute(from),
            Some(TimeSpec::now().shift(-latency_seconds(latency))),
        )
    }

    pub fn from(&self) -> TimeSpec {
        self.from
    }

    pub fn to(&self) -> Option<TimeSpec> {
        self.to
    }

    /// Shift both bounds by the same signed number of seconds.
    pub fn shift(&self, seconds: i64) -> Self {
        let to = self.to.unwrap_or_else(TimeSpec::now);
        Self {
            from: self.from.shift(seconds),
            to: Some(to.shift(seconds)),
        }
    }

    /// Pin both bounds against `now`. An inverted window collapses to
    /// `[from, from)`.
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedRange {
        let from = self.from.resolve(now);
        let to = self.to.map(|t| t.resolve(now)).unwrap_or(now);
        ResolvedRange {
            from,
            to: to.max(from),
        }
    }
}
