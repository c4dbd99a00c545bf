// Library interface for graytail
// Exposes the query model, the follow engine and the Graylog backend

pub mod cancel;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod config;
pub mod engine;
pub mod format;
pub mod graylog;
pub mod logging;
pub mod search;
pub mod signal;
