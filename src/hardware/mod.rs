//! Physical board: coordinate mapping, motion planning and the serial link
//!
//! - [`coords`]: square → gantry steps
//! - [`planner`]: logical move → ordered gantry commands
//! - [`protocol`]: controller line parsing
//! - [`serial`]: the port task

pub mod coords;
pub mod error;
pub mod planner;
pub mod protocol;
pub mod serial;

pub use coords::{Point, RobotGeometry, SquareCoord};
pub use error::{HardwareError, HardwareResult};
pub use planner::{MotionCommand, MotionPlan, MotionPlanner};
pub use serial::SerialLink;
