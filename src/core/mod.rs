//! Core module - process configuration and process-level errors
//!
//! # Configuration
//!
//! [`Config`] is parsed once in `main` from flags and environment variables
//! (after `.env` is loaded). It is validated before any task is spawned;
//! an invalid configuration is the only startup failure that stops the process.
//!
//! Everything past startup degrades instead of failing: a missing token
//! disables the Lichess side, a missing serial port switches to simulation.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{CoreError, CoreResult};
