//! Messages flowing into and out of the coordinator

use crate::hardware::planner::MotionPlan;
use crate::networking::protocol::{GameStreamEvent, RemoteEvent};
use shakmaty::Square;
use shared::protocol::{Link, LinkState, SensorStatus, UiCommand, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Lifted,
    Placed,
}

impl From<SensorStatus> for Transition {
    fn from(status: SensorStatus) -> Self {
        match status {
            SensorStatus::Lifted => Transition::Lifted,
            SensorStatus::Placed => Transition::Placed,
        }
    }
}

impl From<Transition> for SensorStatus {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Lifted => SensorStatus::Lifted,
            Transition::Placed => SensorStatus::Placed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSource {
    Hardware,
    Simulated,
}

/// One presence transition on one square. Consumed immediately, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEvent {
    pub square: Square,
    pub transition: Transition,
    pub source: SensorSource,
}

impl SensorEvent {
    pub fn lifted(square: Square) -> Self {
        Self {
            square,
            transition: Transition::Lifted,
            source: SensorSource::Hardware,
        }
    }

    pub fn placed(square: Square) -> Self {
        Self {
            square,
            transition: Transition::Placed,
            source: SensorSource::Hardware,
        }
    }
}

/// Everything the coordinator reacts to, from all three producers.
#[derive(Debug, Clone)]
pub enum Input {
    Sensor(SensorEvent),
    /// Non-sensor text printed by the board controller
    BoardLog(String),
    LinkStatus { link: Link, state: LinkState },
    /// Own Lichess account id
    Identity(String),
    Remote(RemoteEvent),
    Game {
        game_id: String,
        event: GameStreamEvent,
    },
    Ui(UiCommand),
}

/// Outbound calls to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Move { game_id: String, uci: String },
    Resign { game_id: String },
    /// Offering and accepting a draw are the same call
    Draw { game_id: String, accept: bool },
    Challenge { username: String, limit_secs: u64 },
}

impl Submission {
    /// Short label used in failure reports.
    pub fn action(&self) -> &'static str {
        match self {
            Submission::Move { .. } => "move",
            Submission::Resign { .. } => "resign",
            Submission::Draw { .. } => "draw",
            Submission::Challenge { .. } => "challenge",
        }
    }
}

/// Work produced by one coordinator step, executed by the run loop.
#[derive(Debug, Clone)]
pub enum Effect {
    Ui(UiEvent),
    Actuate(MotionPlan),
    Submit(Submission),
    WatchGame(String),
}
