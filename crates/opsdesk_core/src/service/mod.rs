//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into presentation-facing APIs.
//! - Keep presentation/FFI layers decoupled from storage details.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod feed;
pub mod notification_service;
pub mod session;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
