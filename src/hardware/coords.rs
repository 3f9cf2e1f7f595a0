//! Square → gantry coordinate mapping
//!
//! The gantry addresses the board in motor steps. Square centres sit on a
//! regular grid offset by a margin; the "street" of a square is its centre
//! shifted half a step up and right, which lands on the lane between rows
//! and columns where a carried piece can travel without passing over others.

use shakmaty::Square;

/// Absolute gantry position, in motor steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Square centre plus the file index used for gutter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareCoord {
    pub x: i32,
    pub y: i32,
    /// 0 for the a-file through 7 for the h-file
    pub file: u8,
}

impl SquareCoord {
    pub fn center(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotGeometry {
    pub steps_per_square: i32,
    pub margin_x: i32,
    pub margin_y: i32,
    /// Off-board column for pieces captured on files a-d
    pub left_gutter_x: i32,
    /// Off-board column for pieces captured on files e-h
    pub right_gutter_x: i32,
}

impl Default for RobotGeometry {
    fn default() -> Self {
        Self {
            steps_per_square: 200,
            margin_x: 50,
            margin_y: 50,
            left_gutter_x: 10,
            right_gutter_x: 8 * 200 + 50,
        }
    }
}

impl RobotGeometry {
    #[inline]
    pub fn half_step(&self) -> i32 {
        self.steps_per_square / 2
    }

    pub fn square_to_coord(&self, square: Square) -> SquareCoord {
        let file = file_index(square);
        let rank = rank_index(square);
        SquareCoord {
            x: self.margin_x + i32::from(file) * self.steps_per_square,
            y: self.margin_y + i32::from(rank) * self.steps_per_square,
            file,
        }
    }

    /// Lane point next to the square centre.
    pub fn street(&self, coord: SquareCoord) -> Point {
        Point {
            x: coord.x + self.half_step(),
            y: coord.y + self.half_step(),
        }
    }

    /// Gutter column for a piece removed from `file`. Fixed split, not nearest-edge.
    pub fn gutter_x(&self, file: u8) -> i32 {
        if file < 4 {
            self.left_gutter_x
        } else {
            self.right_gutter_x
        }
    }
}

#[inline]
pub fn file_index(square: Square) -> u8 {
    square.file().char() as u8 - b'a'
}

#[inline]
pub fn rank_index(square: Square) -> u8 {
    square.rank().char() as u8 - b'1'
}
