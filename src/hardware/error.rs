//! Error types for hardware module

use thiserror::Error;

/// Errors raised by the serial link to the board controller
#[derive(Error, Debug)]
pub enum HardwareError {
    /// Port missing, busy or not permitted
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Read or write on an open port failed
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for hardware operations
pub type HardwareResult<T> = Result<T, HardwareError>;
