//! Error types for networking module
//!
//! Everything that can go wrong talking to Lichess. None of these are fatal:
//! stream failures become link status changes and failed submissions are
//! reported back to the dashboard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LichessError {
    /// Connection, TLS or body transfer failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Lichess answered with a non-success status
    #[error("Lichess returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No API token configured
    #[error("Lichess is not configured")]
    Disabled,
}

/// Result type alias for Lichess operations
pub type LichessResult<T> = Result<T, LichessError>;
