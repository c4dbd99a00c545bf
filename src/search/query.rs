//! Immutable query descriptor.

use super::range::SearchRange;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

/// Everything a backend needs to run one search.
///
/// Queries are built once and never mutated; the follow loop derives a
/// fresh copy per cycle with [`SearchQuery::with_range`]. Building one
/// performs no I/O and no validation against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    range: SearchRange,
    query: String,
    limit: Option<usize>,
    filter: Option<String>,
    fields: Vec<String>,
    sort: Option<Sort>,
}

impl SearchQuery {
    pub fn new(range: SearchRange, query: impl Into<String>) -> Self {
        Self {
            range,
            query: query.into(),
            limit: None,
            filter: None,
            fields: Vec::new(),
            sort: None,
        }
    }

    /// Cap the number of results. `None` retrieves every page.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Restrict to one stream.
    pub fn with_stream(mut self, stream: Option<&str>) -> Self {
        self.filter = stream.map(|id| format!("streams:{}", id));
        self
    }

    /// Fields to retrieve, deduplicated, first occurrence wins.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.clear();
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    pub fn with_sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }

    /// Copy of this query covering `range`; nothing else changes.
    pub fn with_range(&self, range: SearchRange) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }

    /// Copy suitable for follow mode: unbounded and unsorted, since the
    /// follow loop controls ordering itself.
    pub fn for_follow(&self, range: SearchRange) -> Self {
        Self {
            range,
            limit: None,
            sort: None,
            ..self.clone()
        }
    }

    pub fn range(&self) -> &SearchRange {
        &self.range
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Whether the backend delivers results oldest first. Anything but an
    /// ascending timestamp sort comes back newest first.
    pub fn oldest_first(&self) -> bool {
        matches!(
            &self.sort,
            Some(Sort { field, order: SortOrder::Ascending }) if field == "timestamp"
        )
    }
}
