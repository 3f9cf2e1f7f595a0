use serde::{Deserialize, Serialize};

/// Which outside link a status dot refers to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    Lichess,
    Arduino,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Online,
    Offline,
    /// No hardware attached; commands are dropped and sensors are simulated.
    Sim,
}

/// Presence reading for a single square, encoded the way the board firmware sends it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorStatus {
    #[serde(rename = "0")]
    Lifted,
    #[serde(rename = "1")]
    Placed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
}

/// Coordinator → dashboard
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Log {
        msg: String,
    },
    Status {
        link: Link,
        state: LinkState,
    },
    MatrixUpdate {
        square: String,
        status: SensorStatus,
    },
    GameFull {
        id: String,
        fen: String,
        white: PlayerInfo,
        black: PlayerInfo,
        wtime: u64,
        btime: u64,
        active_color: char,
        me: Option<String>,
    },
    BoardUpdate {
        fen: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        wtime: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        btime: Option<u64>,
        active_color: char,
    },
    GameOver {
        result: String,
        winner: Option<String>,
    },
    DrawOffered,
    ActionFailed {
        action: String,
        reason: String,
    },
}

impl UiEvent {
    pub fn log(msg: impl Into<String>) -> Self {
        UiEvent::Log { msg: msg.into() }
    }
}

/// Time control as typed into the dashboard form; browsers send either a number or a string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum TimeField {
    Seconds(u64),
    Text(String),
}

impl TimeField {
    pub fn seconds(&self) -> Option<u64> {
        match self {
            TimeField::Seconds(secs) => Some(*secs),
            TimeField::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Dashboard → coordinator
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiCommand {
    Challenge {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        time: Option<TimeField>,
    },
    ManualMove {
        notation: String,
    },
    Resign,
    OfferDraw,
    AcceptDraw,
    SimulateSensor {
        square: String,
        status: SensorStatus,
    },
}
