//! Process configuration
//!
//! Values come from command line flags with environment fallbacks. `main`
//! loads a `.env` file with `dotenvy` before parsing, so the same keys the
//! setup script writes (`LICHESS_TOKEN`, `SERIAL_PORT`, `BAUD_RATE`) work
//! unchanged.

use crate::core::error::{CoreError, CoreResult};
use crate::hardware::coords::RobotGeometry;
use clap::{Args, Parser};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Accepted square size in steps; keeps every derived coordinate inside `i32`
const STEPS_PER_SQUARE: RangeInclusive<i32> = 1..=100_000;
/// Accepted margin and gutter offsets in steps
const OFFSET_STEPS: RangeInclusive<i32> = -1_000_000..=1_000_000;

#[derive(Parser, Debug, Clone)]
#[command(name = "wardom", version, about = "Physical chessboard bridge for Lichess")]
pub struct Config {
    /// Lichess personal API token (board:play scope)
    #[arg(long, env = "LICHESS_TOKEN", hide_env_values = true)]
    pub lichess_token: Option<String>,

    /// Base URL of the Lichess instance
    #[arg(long, env = "LICHESS_URL", default_value = "https://lichess.org")]
    pub lichess_url: String,

    /// Serial device of the board controller; omit to run in simulation mode
    #[arg(long, env = "SERIAL_PORT")]
    pub serial_port: Option<String>,

    #[arg(long, env = "BAUD_RATE", default_value_t = 115_200)]
    pub baud_rate: u32,

    /// Port the dashboard server listens on
    #[arg(long, env = "HTTP_PORT", default_value_t = 3000)]
    pub http_port: u16,

    /// Delay before reopening the Lichess event stream after it drops
    #[arg(long, env = "RECONNECT_SECS", default_value_t = 5)]
    pub reconnect_secs: u64,

    #[command(flatten)]
    pub geometry: GeometryArgs,
}

/// Gantry calibration, in motor steps.
#[derive(Args, Debug, Clone)]
pub struct GeometryArgs {
    #[arg(long, env = "STEPS_PER_SQUARE", default_value_t = 200)]
    pub steps_per_square: i32,

    #[arg(long, env = "MARGIN_X", default_value_t = 50)]
    pub margin_x: i32,

    #[arg(long, env = "MARGIN_Y", default_value_t = 50)]
    pub margin_y: i32,

    #[arg(long, env = "LEFT_GUTTER_X", default_value_t = 10)]
    pub left_gutter_x: i32,

    /// Defaults to eight squares plus the margin
    #[arg(long, env = "RIGHT_GUTTER_X")]
    pub right_gutter_x: Option<i32>,
}

impl Config {
    pub fn validate(&self) -> CoreResult<()> {
        let g = &self.geometry;
        check_range("steps_per_square", g.steps_per_square, &STEPS_PER_SQUARE)?;
        check_range("margin_x", g.margin_x, &OFFSET_STEPS)?;
        check_range("margin_y", g.margin_y, &OFFSET_STEPS)?;
        check_range("left_gutter_x", g.left_gutter_x, &OFFSET_STEPS)?;
        if let Some(right) = g.right_gutter_x {
            check_range("right_gutter_x", right, &OFFSET_STEPS)?;
        }
        if self.baud_rate == 0 {
            return Err(CoreError::InvalidConfig {
                message: "baud_rate must be non-zero".to_string(),
            });
        }
        if self.lichess_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "lichess_url must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Token with surrounding whitespace removed; blank tokens count as absent.
    pub fn token(&self) -> Option<&str> {
        self.lichess_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }

    pub fn geometry(&self) -> RobotGeometry {
        let g = &self.geometry;
        RobotGeometry {
            steps_per_square: g.steps_per_square,
            margin_x: g.margin_x,
            margin_y: g.margin_y,
            left_gutter_x: g.left_gutter_x,
            right_gutter_x: g
                .right_gutter_x
                .unwrap_or(8 * g.steps_per_square + g.margin_x),
        }
    }
}

fn check_range(name: &str, value: i32, range: &RangeInclusive<i32>) -> CoreResult<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(CoreError::InvalidConfig {
        message: format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        ),
    })
}
