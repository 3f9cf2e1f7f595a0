//! Lichess stream payloads
//!
//! Both the account event stream and the per-game board stream are NDJSON.
//! Each line is parsed here, once, into a typed event; everything past this
//! module works with these types only. Unknown `type` values map to `Other`
//! and unparseable lines are dropped.

use serde::Deserialize;
use shared::protocol::PlayerInfo;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameRef {
    pub id: String,
}

/// Account-level notification from `/api/stream/event`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RemoteEvent {
    GameStart { game: GameRef },
    GameFinish { game: GameRef },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Present instead of id/name when the seat is taken by the Lichess AI
    #[serde(default)]
    pub ai_level: Option<u8>,
}

impl Player {
    pub fn info(&self) -> PlayerInfo {
        let name = match (&self.name, self.ai_level) {
            (Some(name), _) => name.clone(),
            (None, Some(level)) => format!("Stockfish level {level}"),
            (None, None) => self.id.clone().unwrap_or_default(),
        };
        PlayerInfo {
            id: self.id.clone().unwrap_or_default(),
            name,
        }
    }
}

fn default_status() -> String {
    "started".to_string()
}

/// Mutable part of a game: move list, clocks, status and draw flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameUpdate {
    /// Space-separated UCI moves since the initial position
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub wtime: Option<u64>,
    #[serde(default)]
    pub btime: Option<u64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub wdraw: bool,
    #[serde(default)]
    pub bdraw: bool,
}

impl Default for GameUpdate {
    fn default() -> Self {
        Self {
            moves: String::new(),
            wtime: None,
            btime: None,
            status: default_status(),
            winner: None,
            wdraw: false,
            bdraw: false,
        }
    }
}

impl GameUpdate {
    pub fn move_list(&self) -> Vec<&str> {
        self.moves.split_whitespace().collect()
    }

    pub fn last_move(&self) -> Option<&str> {
        self.moves.split_whitespace().last()
    }

    pub fn ply_count(&self) -> usize {
        self.moves.split_whitespace().count()
    }
}

/// Full game description, always the first line of a board stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    #[serde(default)]
    pub white: Player,
    #[serde(default)]
    pub black: Player,
    #[serde(default)]
    pub initial_fen: Option<String>,
    pub state: GameUpdate,
}

/// Line from `/api/board/game/stream/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum GameStreamEvent {
    #[serde(rename = "gameFull")]
    Snapshot(GameSnapshot),
    #[serde(rename = "gameState")]
    Update(GameUpdate),
    /// Transport failure while the stream was open; produced locally, never parsed
    #[serde(skip)]
    StreamError(String),
    /// The server ended the stream; produced locally, never parsed
    #[serde(skip)]
    Closed,
    #[serde(other)]
    Other,
}

pub fn parse_event_line(line: &str) -> Option<RemoteEvent> {
    parse_json(line)
}

pub fn parse_game_line(line: &str) -> Option<GameStreamEvent> {
    parse_json(line)
}

fn parse_json<T: serde::de::DeserializeOwned>(line: &str) -> Option<T> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("[LICHESS] Dropped unparseable line ({}): {}", e, line);
            None
        }
    }
}
