//! Dashboard server
//!
//! Serves the WebSocket the dashboard talks over plus a small HTTP API.
//! The server holds no game state: commands are forwarded to the
//! coordinator and coordinator events are broadcast to every socket.

pub mod api;
pub mod socket;

pub use api::{router, AppState};
