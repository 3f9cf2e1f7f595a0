//! Error types for core module
//!
//! Provides custom error types for process-level concerns: configuration
//! validation and binding the dashboard listener.

use thiserror::Error;

/// Errors that can occur in the core module
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration value rejected during validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Dashboard listener could not be bound
    #[error("Failed to bind dashboard listener on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
