//! Shared utilities for the claim ledger.

pub mod logging;
pub mod time;

pub use logging::{init_tracing, LogFormat};
pub use time::{format_duration, format_remaining};
