//! Blocking HTTP client for Graylog's universal absolute search.
//!
//! Graylog bounds are inclusive at millisecond precision, so a half-open
//! window `[from, to)` is sent as `from .. to - 1ms`.

use super::types::{SearchResponse, SystemInfo};
use crate::search::{
    HostTimezone, Message, ResolvedRange, SearchBackend, SearchError, SearchQuery, SearchResult,
};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Messages requested per page.
pub const PAGE_SIZE: usize = 1000;

/// Upper bound on pages fetched for one query.
pub const MAX_PAGES: usize = 100;

const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Where and how to reach a Graylog node.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    pub host: String,
    pub port: u16,
    pub endpoint: String,
    pub tls: bool,
    pub username: String,
    pub password: String,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl Connection {
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        let endpoint = self.endpoint.trim_end_matches('/');
        let endpoint = if endpoint.is_empty() || endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };
        format!("{}://{}:{}{}", scheme, self.host, self.port, endpoint)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url())
            .field("username", &self.username)
            .field("proxy", &self.proxy)
            .finish()
    }
}

pub struct GraylogClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    max_pages: usize,
}

impl fmt::Debug for GraylogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraylogClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish()
    }
}

impl fmt::Display for GraylogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

fn wire_time(instant: &DateTime<Utc>) -> String {
    instant.format(WIRE_TIME_FORMAT).to_string()
}

impl GraylogClient {
    pub fn new(connection: &Connection) -> Result<Self, SearchError> {
        let mut builder = Client::builder().timeout(connection.timeout);
        if let Some(proxy) = &connection.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| SearchError::Config(format!("invalid proxy `{}`: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| SearchError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: connection.base_url(),
            username: connection.username.clone(),
            password: connection.password.clone(),
            max_pages: MAX_PAGES,
        })
    }

    /// Cap the number of pages fetched per query.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn check(resp: Response) -> Result<Response, SearchError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SearchError::Unauthorized(status.as_u16()))
            }
            _ => {
                let body = resp.text().unwrap_or_default();
                Err(SearchError::Status {
                    status: status.as_u16(),
                    body: if body.is_empty() {
                        status.canonical_reason().unwrap_or("").to_string()
                    } else {
                        body
                    },
                })
            }
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, SearchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?params, "graylog request");
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
            .query(params)
            .send()
            .map_err(|e| SearchError::Network(e.to_string()))?;
        Self::check(resp)?
            .json::<T>()
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    /// Timezone configured on the Graylog node.
    pub fn host_timezone(&self) -> Result<HostTimezone, SearchError> {
        let info: SystemInfo = self.get_json("/system", &[])?;
        let name = info
            .timezone
            .ok_or_else(|| SearchError::InvalidResponse("no timezone in /system".into()))?;
        name.parse::<HostTimezone>()
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    fn page_params(
        query: &SearchQuery,
        range: &ResolvedRange,
        limit: usize,
        offset: usize,
    ) -> Vec<(&'static str, String)> {
        let inclusive_to = range
            .to
            .checked_sub_signed(TimeDelta::milliseconds(1))
            .unwrap_or(range.from);
        let mut params = vec![
            ("query", query.query().to_string()),
            ("from", wire_time(&range.from)),
            ("to", wire_time(&inclusive_to)),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        if !query.fields().is_empty() {
            let mut fields: Vec<&str> = query.fields().iter().map(String::as_str).collect();
            if !fields.contains(&"timestamp") {
                fields.push("timestamp");
            }
            params.push(("fields", fields.join(",")));
        }
        if let Some(filter) = query.filter() {
            params.push(("filter", filter.to_string()));
        }
        if let Some(sort) = query.sort() {
            params.push(("sort", format!("{}:{}", sort.field, sort.order)));
        }
        params
    }
}

impl SearchBackend for GraylogClient {
    fn search(&self, query: &SearchQuery, now: DateTime<Utc>) -> Result<SearchResult, SearchError> {
        let range = query.range().resolve(now);
        if range.is_empty() {
            tracing::debug!(from = %range.from, "empty window, skipping request");
            return Ok(SearchResult::empty(range.from));
        }

        let mut messages = Vec::new();
        let mut total_results = None;
        let mut reported_to = None;
        let mut offset = 0usize;

        for _ in 0..self.max_pages {
            let want = match query.limit() {
                Some(limit) => limit.saturating_sub(messages.len()).min(PAGE_SIZE),
                None => PAGE_SIZE,
            };
            if want == 0 {
                break;
            }

            let params = Self::page_params(query, &range, want, offset);
            let page: SearchResponse = self.get_json("/search/universal/absolute", &params)?;

            let got = page.messages.len();
            total_results = page.total_results.or(total_results);
            if reported_to.is_none() {
                reported_to = page
                    .to
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&Utc));
            }
            messages.extend(page.messages.into_iter().map(|m| Message::new(m.message)));
            offset += got;

            let exhausted = total_results.is_some_and(|t| offset as u64 >= t);
            if got < want || exhausted {
                break;
            }
        }

        tracing::debug!(
            messages = messages.len(),
            total = ?total_results,
            "search complete"
        );

        if query.limit().is_none() {
            if let Some(total) = total_results.filter(|t| *t > offset as u64) {
                tracing::debug!(
                    fetched = offset,
                    total,
                    from = %range.from,
                    "page limit reached"
                );
            }
        }

        // The backend echoes the inclusive bound it used
        let range_to = match reported_to {
            Some(t) => t
                .checked_add_signed(TimeDelta::milliseconds(1))
                .map_or(range.to, |t| t.min(range.to)),
            None => range.to,
        };

        Ok(SearchResult {
            messages,
            range_to,
            total_results,
        })
    }
}
