//! Wire types shared between the coordinator and the dashboard server.

pub mod protocol;

pub use protocol::{Link, LinkState, PlayerInfo, SensorStatus, TimeField, UiCommand, UiEvent};
