//! Graylog REST API backend.

pub mod client;
pub mod types;

pub use client::{Connection, GraylogClient, MAX_PAGES, PAGE_SIZE};
