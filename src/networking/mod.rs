//! Lichess connectivity
//!
//! [`protocol`] holds the stream payload types, [`ndjson`] reassembles
//! lines from HTTP chunks and [`lichess`] is the client plus the stream
//! tasks that feed the coordinator.

pub mod error;
pub mod lichess;
pub mod ndjson;
pub mod protocol;

pub use error::{LichessError, LichessResult};
pub use lichess::{LichessClient, RemoteService};
pub use protocol::{GameSnapshot, GameStreamEvent, GameUpdate, RemoteEvent};
