//! Utility functions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version information for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Whether a refresh last completed at `last_refresh` is due again at `now`.
///
/// `None` means the refresh never succeeded and is always due. The threshold is
/// exclusive: exactly `threshold` after the last refresh is still cooling down.
pub fn is_due(now: DateTime<Utc>, last_refresh: Option<DateTime<Utc>>, threshold: Duration) -> bool {
    let Some(last) = last_refresh else {
        return true;
    };
    let threshold = match chrono::Duration::from_std(threshold) {
        Ok(t) => t,
        Err(_) => return false,
    };
    now.signed_duration_since(last) > threshold
}

/// Round to the nearest integer, ties to even. Negative zero collapses to zero.
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even() + 0.0
}
