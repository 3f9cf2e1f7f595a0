//! Motion planning - logical move → gantry command sequence
//!
//! The gantry drags pieces with an electromagnet. A carried piece never
//! crosses a square diagonally: it is pulled from the square centre onto
//! the street (half a step off centre), travels along the street first in
//! X then in Y, and is pushed back to the destination centre.
//!
//! Captures are cleared first: the victim is dragged out along its own
//! street to a gutter column beside the board. Files a-d go to the left
//! gutter, files e-h to the right.
//!
//! Only the mover and the victim are accounted for. Other pieces sitting
//! on the lanes are not avoided.

use crate::game::engine::LogicalMove;
use crate::hardware::coords::{Point, RobotGeometry};
use shakmaty::Square;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionCommand {
    MoveTo(Point),
    MagnetOn,
    MagnetOff,
}

impl fmt::Display for MotionCommand {
    /// Wire form understood by the board firmware.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::MoveTo(p) => write!(f, "M{},{}", p.x, p.y),
            MotionCommand::MagnetOn => f.write_str("MAG:ON"),
            MotionCommand::MagnetOff => f.write_str("MAG:OFF"),
        }
    }
}

/// Ordered commands; executed strictly front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionPlan {
    commands: Vec<MotionCommand>,
}

impl MotionPlan {
    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Wire lines, one per command, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }

    fn move_to(&mut self, p: Point) {
        self.commands.push(MotionCommand::MoveTo(p));
    }

    fn push(&mut self, command: MotionCommand) {
        self.commands.push(command);
    }
}

impl IntoIterator for MotionPlan {
    type Item = MotionCommand;
    type IntoIter = std::vec::IntoIter<MotionCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionPlanner {
    geometry: RobotGeometry,
}

impl MotionPlanner {
    pub fn new(geometry: RobotGeometry) -> Self {
        Self { geometry }
    }

    pub fn plan(&self, mv: &LogicalMove) -> MotionPlan {
        let mut plan = MotionPlan::default();
        if let Some(capture) = mv.captured {
            self.remove_to_gutter(capture.square, &mut plan);
        }
        self.carry(mv.from, mv.to, &mut plan);
        if let Some((rook_from, rook_to)) = mv.castle_rook {
            self.carry(rook_from, rook_to, &mut plan);
        }
        plan
    }

    fn remove_to_gutter(&self, square: Square, plan: &mut MotionPlan) {
        let victim = self.geometry.square_to_coord(square);
        let street = self.geometry.street(victim);

        plan.move_to(victim.center());
        plan.push(MotionCommand::MagnetOn);
        plan.move_to(street);
        plan.move_to(Point {
            x: self.geometry.gutter_x(victim.file),
            y: street.y,
        });
        plan.push(MotionCommand::MagnetOff);
    }

    fn carry(&self, from: Square, to: Square, plan: &mut MotionPlan) {
        let start = self.geometry.square_to_coord(from);
        let end = self.geometry.square_to_coord(to);
        let street_start = self.geometry.street(start);
        let street_end = self.geometry.street(end);

        plan.move_to(start.center());
        plan.push(MotionCommand::MagnetOn);
        plan.move_to(street_start);
        // X leg before Y leg keeps the piece on whole-rank/whole-file lanes
        if street_start.x != street_end.x {
            plan.move_to(Point {
                x: street_end.x,
                y: street_start.y,
            });
        }
        if street_start.y != street_end.y {
            plan.move_to(street_end);
        }
        plan.move_to(end.center());
        plan.push(MotionCommand::MagnetOff);
    }
}
