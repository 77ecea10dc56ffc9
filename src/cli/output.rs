//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ConfigError(_) => format!("{}\nRun `qmaker config show` to inspect the effective configuration.", e),
        ApiError::AuthFailed(_) => format!("{}\nCheck api.api_key or QMAKER__API__API_KEY.", e),
        _ => e.to_string(),
    }
}
