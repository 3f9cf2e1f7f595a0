//! Move detection from square presence sensors
//!
//! The board only reports "piece left square" and "piece arrived on square".
//! The detector pairs a lift of a piece belonging to the side to move with
//! the next placement and asks the rules engine whether that pair is a legal
//! move.
//!
//! # Why lifts of the other colour are ignored
//!
//! During a capture the operator lifts the victim too. The victim belongs to
//! the side not on move, so its lift never replaces the pending lift of the
//! capturing piece.
//!
//! # Retry
//!
//! An illegal placement keeps the pending lift, so the operator can slide
//! the same piece on to another square without lifting it again.

use crate::game::engine::{ChessEngine, LogicalMove};
use crate::game::events::{SensorEvent, Transition};
use shakmaty::Square;
use tracing::debug;

/// A validated move together with the position it produces.
#[derive(Debug, Clone)]
pub struct DetectedMove {
    pub logical: LogicalMove,
    pub next: ChessEngine,
}

#[derive(Debug, Clone)]
pub enum Detection {
    /// A piece of the side to move was lifted and is now pending
    Lifted(Square),
    /// A pending lift resolved into a legal move
    Accepted(Box<DetectedMove>),
    /// A pending lift was placed on a square the rules engine refused
    Rejected { from: Square, to: Square },
    /// Nothing changed
    Ignored,
}

#[derive(Debug, Default, Clone)]
pub struct MoveDetector {
    pending: Option<Square>,
}

impl MoveDetector {
    pub fn pending(&self) -> Option<Square> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending lift, e.g. when a new game starts.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn process(&mut self, board: &ChessEngine, event: &SensorEvent) -> Detection {
        match event.transition {
            Transition::Lifted => self.on_lift(board, event.square),
            Transition::Placed => self.on_place(board, event.square),
        }
    }

    fn on_lift(&mut self, board: &ChessEngine, square: Square) -> Detection {
        match board.piece_at(square) {
            Some(piece) if piece.color == board.turn() => {
                self.pending = Some(square);
                Detection::Lifted(square)
            }
            _ => Detection::Ignored,
        }
    }

    fn on_place(&mut self, board: &ChessEngine, square: Square) -> Detection {
        let Some(from) = self.pending else {
            return Detection::Ignored;
        };
        match board.try_move(from, square) {
            Ok((next, logical)) => {
                self.pending = None;
                Detection::Accepted(Box::new(DetectedMove { logical, next }))
            }
            Err(e) => {
                debug!("[SENSOR] Placement {} -> {} refused: {}", from, square, e);
                Detection::Rejected { from, to: square }
            }
        }
    }
}
