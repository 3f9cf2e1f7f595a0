//! Remote session synchronisation
//!
//! Reconciles the authoritative local position with what Lichess reports
//! for the current game. A `gameFull` snapshot rebuilds the position from
//! scratch; each `gameState` update carries the whole move list, of which
//! only the newest move matters.
//!
//! # Echoes
//!
//! A move detected on the physical board is applied locally first and then
//! submitted. Lichess later sends it back in an update. When the remote
//! move list is no longer than the local history and the remote last move
//! sits at the same ply locally, the update is an echo (or stale) and the
//! position is left alone.
//!
//! # Termination and draw offers
//!
//! The game-over notice is emitted once per session, the first time a
//! status other than `created`/`started` shows up. A draw offer is surfaced
//! when the opponent's flag rises, never for our own offer.
//!
//! # Re-announced games
//!
//! Lichess announces an ongoing game again after the event stream
//! reconnects. That is a no-op while the game stream is still open; once it
//! has closed or failed, the announcement reopens it and the next snapshot
//! rebuilds the board.

use crate::game::engine::{ChessEngine, LogicalMove};
use crate::game::error::GameError;
use crate::networking::protocol::{GameSnapshot, GameUpdate};
use shared::protocol::{Link, LinkState, UiEvent};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSession {
    pub game_id: String,
    pub white_id: Option<String>,
    pub black_id: Option<String>,
    pub white_name: Option<String>,
    pub black_name: Option<String>,
    pub clock_white_ms: Option<u64>,
    pub clock_black_ms: Option<u64>,
    pub draw_offered_by_white: bool,
    pub draw_offered_by_black: bool,
    pub terminated: bool,
    /// Dashboard text for the final status, e.g. "Checkmate"
    pub termination_reason: Option<String>,
    pub winner: Option<String>,
    /// A game stream is open for this session
    pub watching: bool,
}

impl RemoteSession {
    fn new(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            watching: true,
            ..Self::default()
        }
    }

    fn opponent_offers(&self, identity: Option<&str>) -> bool {
        let i_am_white = identity.is_some() && identity == self.white_id.as_deref();
        if i_am_white {
            self.draw_offered_by_black
        } else {
            self.draw_offered_by_white
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStart {
    /// Notification for the game already being followed
    Ignored,
    Started,
    /// Current game whose stream had ended; it is opened again
    Resumed,
}

/// What an update did to the position.
#[derive(Debug, Clone)]
pub enum MoveSync {
    /// Remote move applied; the physical board has to follow
    Applied(LogicalMove),
    /// The position already holds the remote last move
    Echo,
    NoMove,
    /// Remote data the rules engine refused; position unchanged
    Rejected(GameError),
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub outcome: MoveSync,
    pub events: Vec<UiEvent>,
}

/// Dashboard text for a Lichess game status.
pub fn result_text(status: &str) -> &'static str {
    match status {
        "mate" => "Checkmate",
        "resign" => "Resignation",
        "draw" | "stalemate" => "Draw",
        "outoftime" => "Time Out",
        _ => "Game Over",
    }
}

fn in_progress(status: &str) -> bool {
    matches!(status, "created" | "started")
}

#[derive(Debug, Default)]
pub struct SessionSync {
    identity: Option<String>,
    session: Option<RemoteSession>,
}

impl SessionSync {
    pub fn set_identity(&mut self, id: impl Into<String>) {
        self.identity = Some(id.into());
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn session(&self) -> Option<&RemoteSession> {
        self.session.as_ref()
    }

    pub fn is_current(&self, game_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.game_id == game_id)
    }

    /// Game that accepts submissions, if any.
    pub fn active_game_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|session| !session.terminated)
            .map(|session| session.game_id.as_str())
    }

    pub fn on_game_start(&mut self, game_id: &str) -> GameStart {
        if let Some(session) = self.session.as_mut().filter(|s| s.game_id == game_id) {
            if session.watching {
                return GameStart::Ignored;
            }
            info!("[SYNC] Following game {} again", game_id);
            session.watching = true;
            return GameStart::Resumed;
        }
        info!("[SYNC] Following game {}", game_id);
        self.session = Some(RemoteSession::new(game_id));
        GameStart::Started
    }

    /// Rebuild `board` from a full snapshot.
    pub fn on_snapshot(&mut self, board: &mut ChessEngine, snapshot: &GameSnapshot) -> SyncReport {
        let identity = self.identity.clone();
        let session = self
            .session
            .get_or_insert_with(|| RemoteSession::new(&snapshot.id));
        let (white, black) = (snapshot.white.info(), snapshot.black.info());
        session.white_id = snapshot.white.id.clone();
        session.black_id = snapshot.black.id.clone();
        session.white_name = Some(white.name.clone());
        session.black_name = Some(black.name.clone());
        session.clock_white_ms = snapshot.state.wtime;
        session.clock_black_ms = snapshot.state.btime;

        let initial = snapshot.initial_fen.as_deref().unwrap_or("startpos");
        let mut rebuilt = ChessEngine::from_fen(initial).unwrap_or_else(|e| {
            error!("[SYNC] {}. Falling back to the standard start", e);
            ChessEngine::default()
        });

        let mut outcome = MoveSync::NoMove;
        for uci in snapshot.state.move_list() {
            if let Err(e) = rebuilt.play_uci(uci) {
                let e = GameError::RemoteMoveRejected {
                    uci: uci.to_string(),
                    message: e.to_string(),
                };
                error!("[SYNC] Snapshot replay stopped: {}", e);
                outcome = MoveSync::Rejected(e);
                break;
            }
        }
        *board = rebuilt;

        let mut events = vec![UiEvent::GameFull {
            id: snapshot.id.clone(),
            fen: board.fen(),
            white,
            black,
            wtime: snapshot.state.wtime.unwrap_or(0),
            btime: snapshot.state.btime.unwrap_or(0),
            active_color: board.active_color(),
            me: identity.clone(),
        }];
        events.extend(evaluate_flags(session, identity.as_deref(), &snapshot.state));

        SyncReport { outcome, events }
    }

    /// Apply an incremental update to `board`.
    pub fn on_update(&mut self, board: &mut ChessEngine, update: &GameUpdate) -> SyncReport {
        let identity = self.identity.clone();
        let Some(session) = self.session.as_mut() else {
            warn!("[SYNC] Update without a game session");
            return SyncReport {
                outcome: MoveSync::NoMove,
                events: Vec::new(),
            };
        };
        session.clock_white_ms = update.wtime;
        session.clock_black_ms = update.btime;

        let outcome = match update.last_move() {
            None => MoveSync::NoMove,
            Some(last) if already_held(board, update.ply_count(), last) => MoveSync::Echo,
            Some(last) => match board.play_uci(last) {
                Ok(logical) => {
                    info!("[SYNC] Remote move {}", logical.uci);
                    MoveSync::Applied(logical)
                }
                Err(e) => {
                    let e = GameError::RemoteMoveRejected {
                        uci: last.to_string(),
                        message: e.to_string(),
                    };
                    error!("[SYNC] {}", e);
                    MoveSync::Rejected(e)
                }
            },
        };

        let mut events = vec![UiEvent::BoardUpdate {
            fen: board.fen(),
            wtime: update.wtime,
            btime: update.btime,
            active_color: board.active_color(),
        }];
        events.extend(evaluate_flags(session, identity.as_deref(), update));

        SyncReport { outcome, events }
    }

    /// Transport failure on the game stream.
    pub fn on_stream_error(&mut self, message: &str) -> Vec<UiEvent> {
        warn!("[SYNC] Game stream failed: {}", message);
        self.on_stream_closed();
        vec![
            UiEvent::log(format!("Lichess stream error: {message}")),
            UiEvent::Status {
                link: Link::Lichess,
                state: LinkState::Offline,
            },
        ]
    }

    /// The game stream ended; a later announcement may reopen it.
    pub fn on_stream_closed(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.watching = false;
        }
    }
}

fn already_held(board: &ChessEngine, remote_plies: usize, last: &str) -> bool {
    remote_plies <= board.ply_count()
        && remote_plies
            .checked_sub(1)
            .and_then(|ply| board.history().get(ply))
            .is_some_and(|held| held == last)
}

fn evaluate_flags(session: &mut RemoteSession, identity: Option<&str>, state: &GameUpdate) -> Vec<UiEvent> {
    let mut events = Vec::new();

    if !in_progress(&state.status) && !session.terminated {
        let result = result_text(&state.status).to_string();
        info!("[SYNC] Game {} over: {}", session.game_id, state.status);
        session.terminated = true;
        session.termination_reason = Some(result.clone());
        session.winner = state.winner.clone();
        events.push(UiEvent::GameOver {
            result,
            winner: state.winner.clone(),
        });
    }

    let offered_before = session.opponent_offers(identity);
    session.draw_offered_by_white = state.wdraw;
    session.draw_offered_by_black = state.bdraw;
    if session.opponent_offers(identity) && !offered_before {
        info!("[SYNC] Opponent offered a draw");
        events.push(UiEvent::DrawOffered);
    }

    events
}
