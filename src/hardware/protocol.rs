//! Board controller line protocol
//!
//! The controller prints one message per line. Sensor reports look like
//! `MATRIX:e2:1` (1 = piece placed, 0 = piece lifted); anything else is
//! diagnostic text that is forwarded to the dashboard log.

use crate::game::engine::parse_square;
use crate::game::events::{SensorEvent, SensorSource, Transition};

const MATRIX_PREFIX: &str = "MATRIX:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardLine {
    Sensor(SensorEvent),
    Text(String),
}

/// Classify one line from the controller.
///
/// Blank lines and malformed `MATRIX` reports yield `None`.
pub fn parse_line(raw: &str) -> Option<BoardLine> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let Some(rest) = line.strip_prefix(MATRIX_PREFIX) else {
        return Some(BoardLine::Text(line.to_string()));
    };

    let (square, status) = rest.split_once(':')?;
    let square = parse_square(square).ok()?;
    let transition = match status.trim() {
        "0" => Transition::Lifted,
        "1" => Transition::Placed,
        _ => return None,
    };

    Some(BoardLine::Sensor(SensorEvent {
        square,
        transition,
        source: SensorSource::Hardware,
    }))
}
