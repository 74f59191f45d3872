//! # Error Handling
//!
//! Process-level error handling for credbroker, built on `thiserror`.

pub mod types;

pub use types::{BrokerError, Result};
