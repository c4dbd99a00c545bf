//! Follow-mode properties exercised through the public API.

use chrono::{DateTime, TimeDelta, Utc};
use graytail::cancel::CancelToken;
use graytail::clock::Clock;
use graytail::engine::{FollowOptions, RetryPolicy, TailEngine, INTERRUPT_NOTICE};
use graytail::format::{Formatter, OutputMode};
use graytail::search::{
    HostTimezone, Message, SearchBackend, SearchError, SearchQuery, SearchRange, SearchResult,
};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::time::Duration;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Clock that moves forward only while sleeping and cancels a token at a
/// chosen sleep call.
struct TestClock {
    now: Cell<DateTime<Utc>>,
    sleeps: Cell<usize>,
    cancel_at: Option<(usize, CancelToken)>,
}

impl TestClock {
    fn new(start: DateTime<Utc>, cancel_at: Option<(usize, CancelToken)>) -> Self {
        Self {
            now: Cell::new(start),
            sleeps: Cell::new(0),
            cancel_at,
        }
    }
}

impl Clock for &TestClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now
            .set(self.now.get() + TimeDelta::from_std(duration).unwrap());
        self.sleeps.set(self.sleeps.get() + 1);
        if let Some((n, token)) = &self.cancel_at {
            if self.sleeps.get() == *n {
                token.cancel();
            }
        }
    }
}

struct Issued {
    now: DateTime<Utc>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: Option<usize>,
    sorted: bool,
}

/// Serves a fixed timeline, newest first, like Graylog does.
struct Timeline {
    messages: Vec<(DateTime<Utc>, String)>,
    issued: RefCell<Vec<Issued>>,
}

impl Timeline {
    fn new(messages: Vec<(DateTime<Utc>, String)>) -> Self {
        Self {
            messages,
            issued: RefCell::new(Vec::new()),
        }
    }
}

impl SearchBackend for Timeline {
    fn search(&self, query: &SearchQuery, now: DateTime<Utc>) -> Result<SearchResult, SearchError> {
        let range = query.range().resolve(now);
        self.issued.borrow_mut().push(Issued {
            now,
            from: range.from,
            to: range.to,
            limit: query.limit(),
            sorted: query.sort().is_some(),
        });
        let mut hits: Vec<Message> = self
            .messages
            .iter()
            .filter(|(ts, _)| range.contains(ts))
            .map(|(ts, text)| {
                let value = json!({
                    "timestamp": ts.to_rfc3339(),
                    "message": text,
                    "level": 6,
                });
                match value {
                    serde_json::Value::Object(map) => Message::new(map),
                    _ => unreachable!(),
                }
            })
            .collect();
        hits.reverse();
        if let Some(limit) = query.limit() {
            hits.truncate(limit);
        }
        Ok(SearchResult {
            total_results: Some(hits.len() as u64),
            messages: hits,
            range_to: range.to,
        })
    }
}

fn formatter() -> Formatter {
    Formatter::new(OutputMode::Tail, &["message".to_string()], false, HostTimezone::Utc)
}

fn options(latency: u64, interval_ms: u64) -> FollowOptions {
    FollowOptions {
        interval: Duration::from_millis(interval_ms),
        latency,
        retry: RetryPolicy::default(),
    }
}

fn user_query() -> SearchQuery {
    SearchQuery::new(
        SearchRange::parse("5 minutes ago", None, HostTimezone::Utc).unwrap(),
        "*",
    )
    .with_limit(Some(10))
    .with_fields(["message"])
}

#[test]
fn test_follow_boundary_scenario() {
    let start = at("2024-05-01T10:00:00Z");
    let token = CancelToken::new();
    // 1000ms interval = ten 100ms slices; stop during the second wait
    let clock = TestClock::new(start, Some((15, token.clone())));
    let backend = Timeline::new(Vec::new());
    let engine = TailEngine::new(&backend, &clock, formatter());

    let mut out = Vec::new();
    let mut err = Vec::new();
    engine
        .follow(&user_query(), &options(2, 1000), &token, &mut out, &mut err)
        .unwrap();

    let issued = backend.issued.borrow();
    assert_eq!(issued.len(), 2);
    let t = issued[0].to;
    assert_eq!(issued[1].from, t);
    assert_eq!(issued[1].to, issued[1].now - TimeDelta::seconds(2));
    assert_eq!(issued[1].now, start + TimeDelta::seconds(1));
}

#[test]
fn test_follow_clears_limit_and_sort() {
    let token = CancelToken::new();
    let clock = TestClock::new(at("2024-05-01T10:00:00Z"), Some((25, token.clone())));
    let backend = Timeline::new(Vec::new());
    let engine = TailEngine::new(&backend, &clock, formatter());
    let query = user_query().with_sort(Some(graytail::search::Sort {
        field: "timestamp".into(),
        order: graytail::search::SortOrder::Ascending,
    }));

    engine
        .follow(&query, &options(2, 1000), &token, &mut Vec::new(), &mut Vec::new())
        .unwrap();

    for issued in backend.issued.borrow().iter() {
        assert_eq!(issued.limit, None);
        assert!(!issued.sorted);
    }
}

#[test]
fn test_latency_margin_honored_every_cycle() {
    let token = CancelToken::new();
    let clock = TestClock::new(at("2024-05-01T10:00:00Z"), Some((47, token.clone())));
    let backend = Timeline::new(Vec::new());
    let engine = TailEngine::new(&backend, &clock, formatter());

    engine
        .follow(&user_query(), &options(5, 300), &token, &mut Vec::new(), &mut Vec::new())
        .unwrap();

    let issued = backend.issued.borrow();
    assert!(issued.len() > 5);
    for cycle in issued.iter() {
        assert!(cycle.to <= cycle.now - TimeDelta::seconds(5));
    }
}

#[test]
fn test_output_is_chronological_and_complete() {
    let start = at("2024-05-01T10:00:00Z");
    // Bursts of messages sharing a timestamp, including one on a window boundary
    let mut messages = Vec::new();
    for second in 0..6 {
        for n in 0..3 {
            let ts = start + TimeDelta::seconds(second);
            messages.push((ts, format!("s{}-n{}", second, n)));
        }
    }
    let token = CancelToken::new();
    let clock = TestClock::new(start + TimeDelta::seconds(1), Some((90, token.clone())));
    let backend = Timeline::new(messages.clone());
    let engine = TailEngine::new(&backend, &clock, formatter());

    let mut out = Vec::new();
    let outcome = engine
        .follow(&user_query(), &options(1, 1000), &token, &mut out, &mut Vec::new())
        .unwrap();

    let printed: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| l.rsplit(": ").next().unwrap().to_string())
        .collect();

    // Ninth cycle ends at start+8s, past the last burst
    assert_eq!(outcome.cycles, 9);
    let mut seen = std::collections::HashSet::new();
    for line in &printed {
        assert!(seen.insert(line.clone()), "duplicate line {}", line);
    }
    let seconds: Vec<i64> = printed
        .iter()
        .map(|l| l[1..l.find('-').unwrap()].parse().unwrap())
        .collect();
    assert!(seconds.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(printed.len(), messages.len());
}

#[test]
fn test_empty_cycles_still_advance() {
    let start = at("2024-05-01T10:00:00Z");
    let token = CancelToken::new();
    let clock = TestClock::new(start, Some((35, token.clone())));
    let backend = Timeline::new(Vec::new());
    let engine = TailEngine::new(&backend, &clock, formatter());

    let mut out = Vec::new();
    engine
        .follow(&user_query(), &options(2, 1000), &token, &mut out, &mut Vec::new())
        .unwrap();

    assert!(out.is_empty());
    let issued = backend.issued.borrow();
    assert_eq!(issued.len(), 4);
    for pair in issued.windows(2) {
        assert_eq!(pair[1].from, pair[0].to);
        assert!(pair[1].to > pair[0].to);
    }
}

#[test]
fn test_interruption_mid_wait() {
    let start = at("2024-05-01T10:00:00Z");
    let messages = vec![
        (start - TimeDelta::milliseconds(2500), "first".to_string()),
        (start + TimeDelta::seconds(1), "never shown".to_string()),
    ];
    let token = CancelToken::new();
    // Cancel on the third slice of the first wait
    let clock = TestClock::new(start, Some((3, token.clone())));
    let backend = Timeline::new(messages);
    let engine = TailEngine::new(&backend, &clock, formatter());

    let mut out = Vec::new();
    let mut err = Vec::new();
    let outcome = engine
        .follow(&user_query(), &options(2, 1000), &token, &mut out, &mut err)
        .unwrap();

    assert_eq!(outcome.cycles, 1);
    assert_eq!(backend.issued.borrow().len(), 1);
    assert_eq!(clock.sleeps.get(), 3);

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("first"));

    let err = String::from_utf8(err).unwrap();
    assert_eq!(err.matches("Interrupted follow mode").count(), 1);
    assert_eq!(err, format!("{}\n", INTERRUPT_NOTICE));
}

#[test]
fn test_single_shot_basic_tail() {
    let now = at("2024-05-01T10:00:00Z");
    let messages: Vec<(DateTime<Utc>, String)> = (0..15)
        .map(|i| (now - TimeDelta::seconds(60 - i), format!("line {}", i)))
        .collect();
    let backend = Timeline::new(messages);
    let clock = TestClock::new(now, None);
    let engine = TailEngine::new(&backend, &clock, formatter());

    let mut out = Vec::new();
    let result = engine.run_once(&user_query(), &mut out).unwrap();
    assert_eq!(result.messages.len(), 10);

    // The ten most recent, oldest first
    let lines: Vec<String> = String::from_utf8(out).unwrap().lines().map(String::from).collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "[2024-05-01 09:59:05.000] INFO: line 5");
    assert_eq!(lines[9], "[2024-05-01 09:59:14.000] INFO: line 14");
}
