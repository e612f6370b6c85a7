//! Fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching a tile.
///
/// Transport and status errors are normally consumed inside the retry loop
/// and only logged; they surface to callers solely through
/// [`FetchError::RetriesExhausted`] when an attempt cap is configured, or
/// [`FetchError::Cancelled`] when a shutdown was requested mid-retry.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request failed before a status was received (timeout,
    /// connection reset, DNS failure).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The configured attempt cap was reached without a success.
    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    /// A shutdown was requested while the fetch was still retrying.
    #[error("tile fetch cancelled by shutdown")]
    Cancelled,

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),
}
