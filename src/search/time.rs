//! Time expressions and host timezones.
//!
//! A [`TimeSpec`] is either an absolute instant or an offset from "now".
//! Relative specs stay unresolved until a query is issued so that each
//! follow cycle sees a fresh "now".

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Error parsing a user supplied time expression or timezone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("unrecognised time expression `{0}`")]
    Unrecognised(String),
    #[error("time offset out of range in `{0}`")]
    OutOfRange(String),
    #[error("unrecognised timezone `{0}`")]
    Timezone(String),
}

/// One bound of a search range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    Absolute(DateTime<Utc>),
    /// `now + offset`; negative offsets lie in the past.
    Relative(TimeDelta),
}

fn relative_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\s*([a-z]+)\s+ago$").expect("relative time regex is valid")
    })
}

fn unit_seconds(unit: &str) -> Option<i64> {
    let unit = unit.strip_suffix('s').filter(|u| u.len() > 1).unwrap_or(unit);
    match unit {
        "s" | "sec" | "second" => Some(1),
        "m" | "min" | "minute" => Some(60),
        "h" | "hour" => Some(3_600),
        "d" | "day" => Some(86_400),
        "w" | "week" => Some(604_800),
        _ => None,
    }
}

/// Largest accepted `<N> <unit> ago`, roughly a century.
const MAX_OFFSET_DAYS: i64 = 36_600;

fn saturating_seconds(seconds: i64) -> TimeDelta {
    TimeDelta::try_seconds(seconds).unwrap_or(if seconds < 0 {
        TimeDelta::min_value()
    } else {
        TimeDelta::max_value()
    })
}

/// `instant + delta`, pinned to the representable range.
fn saturating_add(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl TimeSpec {
    /// The instant at which the bound is resolved.
    pub fn now() -> Self {
        TimeSpec::Relative(TimeDelta::zero())
    }

    /// Parse `now`, `<N> <unit> ago`, RFC 3339, or a naive date/time in `tz`.
    pub fn parse(input: &str, tz: HostTimezone) -> Result<Self, TimeParseError> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower == "now" {
            return Ok(TimeSpec::now());
        }

        if let Some(caps) = relative_regex().captures(&lower) {
            let amount: i64 = caps[1]
                .parse()
                .map_err(|_| TimeParseError::OutOfRange(trimmed.to_string()))?;
            let unit = unit_seconds(&caps[2])
                .ok_or_else(|| TimeParseError::Unrecognised(trimmed.to_string()))?;
            let offset = amount
                .checked_mul(unit)
                .and_then(TimeDelta::try_seconds)
                .filter(|offset| offset.num_days() <= MAX_OFFSET_DAYS)
                .ok_or_else(|| TimeParseError::OutOfRange(trimmed.to_string()))?;
            return Ok(TimeSpec::Relative(-offset));
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(TimeSpec::Absolute(instant.with_timezone(&Utc)));
        }

        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| TimeParseError::Unrecognised(trimmed.to_string()))?;

        tz.localize(naive)
            .map(TimeSpec::Absolute)
            .ok_or_else(|| TimeParseError::Unrecognised(trimmed.to_string()))
    }

    /// Resolve against the instant the query is issued at. Offsets past
    /// the representable range saturate.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeSpec::Absolute(instant) => *instant,
            TimeSpec::Relative(offset) => saturating_add(now, *offset),
        }
    }

    /// Move the bound by a signed number of seconds, saturating.
    pub fn shift(&self, seconds: i64) -> Self {
        let delta = saturating_seconds(seconds);
        match self {
            TimeSpec::Absolute(instant) => TimeSpec::Absolute(saturating_add(*instant, delta)),
            TimeSpec::Relative(offset) => TimeSpec::Relative(
                offset
                    .checked_add(&delta)
                    .unwrap_or_else(|| saturating_seconds(seconds)),
            ),
        }
    }
}

/// Timezone the Graylog node reports, used for naive inputs and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostTimezone {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
    /// IANA zone such as `Europe/Berlin`.
    Named(Tz),
}

fn offset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").expect("offset regex is valid"))
}

impl HostTimezone {
    /// Interpret a wall-clock time in this zone.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            HostTimezone::Utc => Some(Utc.from_utc_datetime(&naive)),
            HostTimezone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
            HostTimezone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|t| t.with_timezone(&Utc)),
            // Ambiguous wall times at DST fall-back take the first occurrence
            HostTimezone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Render `instant` in this zone with a strftime pattern.
    pub fn format(&self, instant: &DateTime<Utc>, pattern: &str) -> String {
        match self {
            HostTimezone::Utc => instant.format(pattern).to_string(),
            HostTimezone::Local => instant.with_timezone(&Local).format(pattern).to_string(),
            HostTimezone::Fixed(offset) => instant.with_timezone(offset).format(pattern).to_string(),
            HostTimezone::Named(tz) => instant.with_timezone(tz).format(pattern).to_string(),
        }
    }

    /// Render `instant` as RFC 3339 in this zone.
    pub fn rfc3339(&self, instant: &DateTime<Utc>) -> String {
        match self {
            HostTimezone::Utc => instant.to_rfc3339(),
            HostTimezone::Local => instant.with_timezone(&Local).to_rfc3339(),
            HostTimezone::Fixed(offset) => instant.with_timezone(offset).to_rfc3339(),
            HostTimezone::Named(tz) => instant.with_timezone(tz).to_rfc3339(),
        }
    }
}

impl FromStr for HostTimezone {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "etc/utc" | "gmt" | "etc/gmt" | "z" | "zulu" | "universal" => {
                return Ok(HostTimezone::Utc)
            }
            "local" => return Ok(HostTimezone::Local),
            _ => {}
        }

        let Some(caps) = offset_regex().captures(trimmed) else {
            return trimmed
                .parse::<Tz>()
                .map(HostTimezone::Named)
                .map_err(|_| TimeParseError::Timezone(trimmed.to_string()));
        };
        let hours: i32 = caps[2].parse().unwrap_or(0);
        let minutes: i32 = caps[3].parse().unwrap_or(0);
        let sign = if &caps[1] == "-" { -1 } else { 1 };
        FixedOffset::east_opt(sign * (hours * 3_600 + minutes * 60))
            .map(HostTimezone::Fixed)
            .ok_or_else(|| TimeParseError::Timezone(trimmed.to_string()))
    }
}

impl fmt::Display for HostTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostTimezone::Utc => write!(f, "utc"),
            HostTimezone::Local => write!(f, "local"),
            HostTimezone::Fixed(offset) => write!(f, "{}", offset),
            HostTimezone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}
