//! Generation session ids and wall-clock helpers.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Milliseconds since the Unix epoch; zero for clocks set before it.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Unique id for a generation session: `gen-<millis>-<pid>-<counter>`.
pub fn new_session_id() -> String {
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("gen-{}-{}-{}", now_millis(), std::process::id(), seq)
}
