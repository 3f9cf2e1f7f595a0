//! Physical chessboard bridge for Lichess
//!
//! Presence sensors under a real board detect moves, which are validated and
//! played on Lichess; opponent moves coming back are carried out by an
//! XY gantry with an electromagnet.

pub mod core;
pub mod game;
pub mod hardware;
pub mod networking;
