//! Game logic - rules, move detection, remote sync and coordination
//!
//! Pure logic lives in `engine`, `detector` and `sync`; none of it does I/O.
//! The `coordinator` owns one instance of each and is the only place that
//! mutates them.
//!
//! # Module Organization
//!
//! - `engine` - authoritative position backed by `shakmaty`
//! - `detector` - lift/place pairing into legal moves
//! - `sync` - Lichess snapshot/update reconciliation
//! - `events` - coordinator inputs and effects
//! - `coordinator` - the event loop

pub mod coordinator;
pub mod detector;
pub mod engine;
pub mod error;
pub mod events;
pub mod sync;

pub use coordinator::{Coordinator, Outputs};
pub use detector::{Detection, MoveDetector};
pub use engine::{ChessEngine, LogicalMove};
pub use error::{GameError, GameResult};
pub use events::{Effect, Input, SensorEvent, Submission};
pub use sync::{MoveSync, SessionSync};
