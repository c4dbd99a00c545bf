//! Query model and the contract a search backend fulfils.

pub mod query;
pub mod range;
pub mod result;
pub mod time;

pub use query::{SearchQuery, Sort, SortOrder};
pub use range::{ResolvedRange, SearchRange};
pub use result::{Message, SearchResult};
pub use time::{HostTimezone, TimeParseError, TimeSpec};

use chrono::{DateTime, Utc};

/// Failure of a search. Callers treat every variant as one opaque failure;
/// the variants exist for the message.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed ({0}); check username and password")]
    Unauthorized(u16),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Executes a query, fetching as many pages as needed.
///
/// Implementations resolve the query's range against `now`, apply limit,
/// filter and sort, and report in [`SearchResult::range_to`] the latest
/// instant for which the result is complete.
pub trait SearchBackend {
    fn search(&self, query: &SearchQuery, now: DateTime<Utc>) -> Result<SearchResult, SearchError>;
}

impl<B: SearchBackend + ?Sized> SearchBackend for &B {
    fn search(&self, query: &SearchQuery, now: DateTime<Utc>) -> Result<SearchResult, SearchError> {
        (**self).search(query, now)
    }
}
