//! Event coordinator - the single owner of game state
//!
//! Every producer (serial link, Lichess streams, dashboard sockets) sends
//! [`Input`]s down one queue. [`Coordinator::handle`] processes one input to
//! completion and returns the [`Effect`]s it caused; it never awaits, so the
//! board, the pending lift and the remote session are only ever touched from
//! one place in one order.
//!
//! [`Coordinator::run`] is the task wrapper: it pulls inputs and hands each
//! effect to [`Outputs`], which fans them out without blocking. Remote calls
//! are spawned and report failures back to the dashboard on their own.
//!
//! Physical moves detected by the sensors are already on the board, so only
//! moves that arrive from Lichess are turned into motion plans. A locally
//! detected move is committed and submitted but never sent to the gantry.

use crate::game::detector::{Detection, MoveDetector};
use crate::game::engine::{parse_square, ChessEngine};
use crate::game::events::{Effect, Input, SensorEvent, SensorSource, Submission};
use crate::game::sync::{GameStart, MoveSync, SessionSync};
use crate::hardware::coords::RobotGeometry;
use crate::hardware::planner::{MotionPlan, MotionPlanner};
use crate::networking::error::LichessError;
use crate::networking::lichess::{self, RemoteService};
use crate::networking::protocol::{GameStreamEvent, RemoteEvent};
use shared::protocol::{UiCommand, UiEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Opponent used when the dashboard leaves the challenge name blank
pub const DEFAULT_OPPONENT: &str = "stockfish";
/// Clock limit used when the dashboard time field is not a number
pub const DEFAULT_LIMIT_SECS: u64 = 300;

pub struct Coordinator {
    board: ChessEngine,
    detector: MoveDetector,
    session: SessionSync,
    planner: MotionPlanner,
}

impl Coordinator {
    pub fn new(geometry: RobotGeometry) -> Self {
        Self {
            board: ChessEngine::default(),
            detector: MoveDetector::default(),
            session: SessionSync::default(),
            planner: MotionPlanner::new(geometry),
        }
    }

    pub fn board(&self) -> &ChessEngine {
        &self.board
    }

    pub fn detector(&self) -> &MoveDetector {
        &self.detector
    }

    pub fn session(&self) -> &SessionSync {
        &self.session
    }

    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Sensor(event) => self.on_sensor(event),
            Input::BoardLog(text) => {
                info!("[ROBOT] {}", text);
                vec![Effect::Ui(UiEvent::log(format!("Robot: {text}")))]
            }
            Input::LinkStatus { link, state } => vec![Effect::Ui(UiEvent::Status { link, state })],
            Input::Identity(id) => {
                let log = UiEvent::log(format!("Logged in to Lichess as {id}"));
                self.session.set_identity(id);
                vec![Effect::Ui(log)]
            }
            Input::Remote(event) => self.on_remote(event),
            Input::Game { game_id, event } => self.on_game(&game_id, event),
            Input::Ui(command) => self.on_command(command),
        }
    }

    fn on_sensor(&mut self, event: SensorEvent) -> Vec<Effect> {
        let mut effects = vec![Effect::Ui(UiEvent::MatrixUpdate {
            square: event.square.to_string(),
            status: event.transition.into(),
        })];

        match self.detector.process(&self.board, &event) {
            Detection::Lifted(square) => debug!("[SENSOR] Holding {}", square),
            Detection::Accepted(detected) => {
                let uci = detected.logical.uci.clone();
                self.board = detected.next;
                info!("[SENSOR] Move {}", uci);
                effects.push(Effect::Ui(UiEvent::log(format!("Move: {uci}"))));
                effects.push(Effect::Ui(self.board_update()));
                match self.session.active_game_id() {
                    Some(game_id) => effects.push(Effect::Submit(Submission::Move {
                        game_id: game_id.to_string(),
                        uci,
                    })),
                    None => debug!("[SENSOR] No active game, {} kept local", uci),
                }
            }
            Detection::Rejected { from, to } => {
                effects.push(Effect::Ui(UiEvent::log(format!("Illegal move: {from}{to}"))));
            }
            Detection::Ignored => {}
        }
        effects
    }

    fn on_remote(&mut self, event: RemoteEvent) -> Vec<Effect> {
        match event {
            RemoteEvent::GameStart { game } => match self.session.on_game_start(&game.id) {
                GameStart::Ignored => {
                    debug!("[GAME] Already following {}", game.id);
                    Vec::new()
                }
                GameStart::Started => {
                    info!("[GAME] Started: {}", game.id);
                    self.board = ChessEngine::default();
                    self.detector.reset();
                    vec![
                        Effect::Ui(UiEvent::log(format!("Game started: {}", game.id))),
                        Effect::WatchGame(game.id),
                    ]
                }
                GameStart::Resumed => {
                    info!("[GAME] Reopening stream for {}", game.id);
                    vec![Effect::WatchGame(game.id)]
                }
            },
            RemoteEvent::GameFinish { game } => {
                info!("[GAME] Finished: {}", game.id);
                vec![Effect::Ui(UiEvent::log(format!("Game finished: {}", game.id)))]
            }
            RemoteEvent::Other => Vec::new(),
        }
    }

    fn on_game(&mut self, game_id: &str, event: GameStreamEvent) -> Vec<Effect> {
        if !self.session.is_current(game_id) {
            debug!("[SYNC] Dropping event for stale game {}", game_id);
            return Vec::new();
        }

        let report = match event {
            GameStreamEvent::Snapshot(snapshot) => {
                self.detector.reset();
                self.session.on_snapshot(&mut self.board, &snapshot)
            }
            GameStreamEvent::Update(update) => self.session.on_update(&mut self.board, &update),
            GameStreamEvent::StreamError(message) => {
                return self
                    .session
                    .on_stream_error(&message)
                    .into_iter()
                    .map(Effect::Ui)
                    .collect();
            }
            GameStreamEvent::Closed => {
                debug!("[GAME] Stream for {} closed", game_id);
                self.session.on_stream_closed();
                return Vec::new();
            }
            GameStreamEvent::Other => return Vec::new(),
        };

        let mut effects = Vec::new();
        match report.outcome {
            MoveSync::Applied(logical) => {
                self.detector.reset();
                effects.push(Effect::Ui(UiEvent::log(format!("Remote move: {}", logical.uci))));
                effects.push(Effect::Actuate(self.planner.plan(&logical)));
            }
            MoveSync::Rejected(e) => effects.push(Effect::Ui(UiEvent::log(e.to_string()))),
            MoveSync::Echo | MoveSync::NoMove => {}
        }
        effects.extend(report.events.into_iter().map(Effect::Ui));
        effects
    }

    fn on_command(&mut self, command: UiCommand) -> Vec<Effect> {
        match command {
            UiCommand::Challenge { username, time } => {
                let username = username
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| DEFAULT_OPPONENT.to_string());
                let limit_secs = time
                    .and_then(|t| t.seconds())
                    .unwrap_or(DEFAULT_LIMIT_SECS);
                info!("[LICHESS] Challenging {} ({}s)", username, limit_secs);
                vec![
                    Effect::Ui(UiEvent::log(format!(
                        "Challenging {username} ({limit_secs}s)"
                    ))),
                    Effect::Submit(Submission::Challenge {
                        username,
                        limit_secs,
                    }),
                ]
            }
            UiCommand::ManualMove { notation } => {
                let uci = notation.trim().to_string();
                self.in_game("manual move", |game_id| Submission::Move { game_id, uci })
            }
            UiCommand::Resign => self.in_game("resign", |game_id| Submission::Resign { game_id }),
            UiCommand::OfferDraw | UiCommand::AcceptDraw => {
                self.in_game("draw", |game_id| Submission::Draw {
                    game_id,
                    accept: true,
                })
            }
            UiCommand::SimulateSensor { square, status } => match parse_square(&square) {
                Ok(square) => self.on_sensor(SensorEvent {
                    square,
                    transition: status.into(),
                    source: SensorSource::Simulated,
                }),
                Err(e) => vec![Effect::Ui(UiEvent::log(e.to_string()))],
            },
        }
    }

    fn in_game(&self, what: &str, submission: impl FnOnce(String) -> Submission) -> Vec<Effect> {
        match self.session.active_game_id() {
            Some(game_id) => vec![Effect::Submit(submission(game_id.to_string()))],
            None => {
                debug!("[GAME] Ignoring {} without an active game", what);
                vec![Effect::Ui(UiEvent::log(format!("No active game for {what}")))]
            }
        }
    }

    fn board_update(&self) -> UiEvent {
        UiEvent::BoardUpdate {
            fen: self.board.fen(),
            wtime: None,
            btime: None,
            active_color: self.board.active_color(),
        }
    }

    /// Process inputs until every producer has hung up.
    pub async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>, outputs: Outputs) {
        info!("[GAME] Coordinator running");
        while let Some(input) = inputs.recv().await {
            for effect in self.handle(input) {
                outputs.dispatch(effect);
            }
        }
        info!("[GAME] Coordinator stopped");
    }
}

/// Where effects go.
#[derive(Clone)]
pub struct Outputs {
    pub ui: broadcast::Sender<UiEvent>,
    pub motion: mpsc::UnboundedSender<MotionPlan>,
    /// `None` when no Lichess token is configured
    pub remote: Option<Arc<dyn RemoteService>>,
    /// Game streams feed back into the coordinator through this
    pub inputs: mpsc::WeakUnboundedSender<Input>,
}

impl Outputs {
    pub fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::Ui(event) => {
                // No dashboard connected is fine
                let _ = self.ui.send(event);
            }
            Effect::Actuate(plan) => {
                if self.motion.send(plan).is_err() {
                    warn!("[ROBOT] Actuator task gone, motion plan dropped");
                }
            }
            Effect::Submit(submission) => self.submit(submission),
            Effect::WatchGame(game_id) => {
                let (Some(remote), Some(inputs)) = (self.remote.clone(), self.inputs.upgrade()) else {
                    warn!("[LICHESS] Cannot watch {} without a Lichess connection", game_id);
                    return;
                };
                tokio::spawn(lichess::watch_game(remote, game_id, inputs));
            }
        }
    }

    fn submit(&self, submission: Submission) {
        let Some(remote) = self.remote.clone() else {
            report_failure(&self.ui, &submission, &LichessError::Disabled);
            return;
        };
        let ui = self.ui.clone();
        tokio::spawn(async move {
            match lichess::submit(remote.as_ref(), &submission).await {
                Ok(()) => debug!("[LICHESS] {} accepted", submission.action()),
                Err(e) => report_failure(&ui, &submission, &e),
            }
        });
    }
}

fn report_failure(ui: &broadcast::Sender<UiEvent>, submission: &Submission, error: &LichessError) {
    warn!("[LICHESS] {} failed: {}", submission.action(), error);
    let _ = ui.send(UiEvent::ActionFailed {
        action: submission.action().to_string(),
        reason: error.to_string(),
    });
    let _ = ui.send(UiEvent::log(format!(
        "{} failed: {}",
        submission.action(),
        error
    )));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::planner::MotionCommand;
    use crate::hardware::coords::Point;
    use crate::networking::protocol::{GameRef, GameUpdate};
    use shakmaty::Square;
    use shared::protocol::{Link, LinkState, SensorStatus, TimeField};

    fn coordinator_in_game() -> Coordinator {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        coordinator.handle(Input::Identity("me".to_string()));
        coordinator.handle(Input::Remote(RemoteEvent::GameStart {
            game: GameRef {
                id: "g1".to_string(),
            },
        }));
        coordinator
    }

    fn update(moves: &str) -> Input {
        Input::Game {
            game_id: "g1".to_string(),
            event: GameStreamEvent::Update(GameUpdate {
                moves: moves.to_string(),
                ..GameUpdate::default()
            }),
        }
    }

    fn submissions(effects: &[Effect]) -> Vec<&Submission> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Submit(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_detected_move_is_committed_and_submitted() {
        let mut coordinator = coordinator_in_game();
        coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::E2)));
        let effects = coordinator.handle(Input::Sensor(SensorEvent::placed(Square::E4)));

        assert_eq!(coordinator.board().last_uci(), Some("e2e4"));
        assert_eq!(
            submissions(&effects),
            [&Submission::Move {
                game_id: "g1".to_string(),
                uci: "e2e4".to_string()
            }]
        );
        assert!(!effects.iter().any(|e| matches!(e, Effect::Actuate(_))));
    }

    #[test]
    fn test_sensor_events_are_mirrored() {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        let effects = coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::A7)));
        assert!(matches!(
            &effects[..],
            [Effect::Ui(UiEvent::MatrixUpdate { square, status: SensorStatus::Lifted })] if square == "a7"
        ));
    }

    #[test]
    fn test_move_without_game_is_not_submitted() {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::G1)));
        let effects = coordinator.handle(Input::Sensor(SensorEvent::placed(Square::F3)));
        assert!(submissions(&effects).is_empty());
        assert_eq!(coordinator.board().ply_count(), 1);
    }

    #[test]
    fn test_remote_move_drives_actuator() {
        let mut coordinator = coordinator_in_game();
        coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::E2)));
        coordinator.handle(Input::Sensor(SensorEvent::placed(Square::E4)));

        let effects = coordinator.handle(update("e2e4 d7d5"));
        let plan = effects
            .iter()
            .find_map(|e| match e {
                Effect::Actuate(plan) => Some(plan),
                _ => None,
            })
            .expect("remote move should be actuated");
        assert_eq!(
            plan.commands()[0],
            MotionCommand::MoveTo(Point { x: 650, y: 1250 })
        );
        assert_eq!(coordinator.board().ply_count(), 2);
    }

    #[test]
    fn test_echo_is_not_actuated() {
        let mut coordinator = coordinator_in_game();
        coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::E2)));
        coordinator.handle(Input::Sensor(SensorEvent::placed(Square::E4)));

        let effects = coordinator.handle(update("e2e4"));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Actuate(_))));
        assert_eq!(coordinator.board().ply_count(), 1);
    }

    #[test]
    fn test_events_for_other_games_are_dropped() {
        let mut coordinator = coordinator_in_game();
        let effects = coordinator.handle(Input::Game {
            game_id: "old".to_string(),
            event: GameStreamEvent::Update(GameUpdate {
                moves: "e2e4".to_string(),
                ..GameUpdate::default()
            }),
        });
        assert!(effects.is_empty());
        assert_eq!(coordinator.board().ply_count(), 0);
    }

    #[test]
    fn test_game_start_resets_and_watches_once() {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::E2)));
        coordinator.handle(Input::Sensor(SensorEvent::placed(Square::E4)));
        coordinator.handle(Input::Sensor(SensorEvent::lifted(Square::D7)));

        let start = Input::Remote(RemoteEvent::GameStart {
            game: GameRef {
                id: "g9".to_string(),
            },
        });
        let effects = coordinator.handle(start.clone());
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::WatchGame(id) if id == "g9")));
        assert_eq!(coordinator.board().ply_count(), 0);
        assert!(!coordinator.detector().is_pending());

        assert!(coordinator.handle(start).is_empty());
    }

    #[test]
    fn test_challenge_defaults() {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        let effects = coordinator.handle(Input::Ui(UiCommand::Challenge {
            username: Some("  ".to_string()),
            time: Some(TimeField::Text("five minutes".to_string())),
        }));
        assert_eq!(
            submissions(&effects),
            [&Submission::Challenge {
                username: "stockfish".to_string(),
                limit_secs: 300
            }]
        );

        let effects = coordinator.handle(Input::Ui(UiCommand::Challenge {
            username: Some("magnus".to_string()),
            time: Some(TimeField::Text("600".to_string())),
        }));
        assert_eq!(
            submissions(&effects),
            [&Submission::Challenge {
                username: "magnus".to_string(),
                limit_secs: 600
            }]
        );
    }

    #[test]
    fn test_game_actions_need_active_game() {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        for command in [UiCommand::Resign, UiCommand::OfferDraw, UiCommand::AcceptDraw] {
            assert!(submissions(&coordinator.handle(Input::Ui(command))).is_empty());
        }

        let mut coordinator = coordinator_in_game();
        let effects = coordinator.handle(Input::Ui(UiCommand::AcceptDraw));
        assert_eq!(
            submissions(&effects),
            [&Submission::Draw {
                game_id: "g1".to_string(),
                accept: true
            }]
        );
        let effects = coordinator.handle(Input::Ui(UiCommand::ManualMove {
            notation: " e2e4 ".to_string(),
        }));
        assert_eq!(
            submissions(&effects),
            [&Submission::Move {
                game_id: "g1".to_string(),
                uci: "e2e4".to_string()
            }]
        );
        // Manual moves wait for the remote echo
        assert_eq!(coordinator.board().ply_count(), 0);
    }

    #[test]
    fn test_finished_game_stops_submissions() {
        let mut coordinator = coordinator_in_game();
        coordinator.handle(Input::Game {
            game_id: "g1".to_string(),
            event: GameStreamEvent::Update(GameUpdate {
                status: "resign".to_string(),
                ..GameUpdate::default()
            }),
        });
        assert!(submissions(&coordinator.handle(Input::Ui(UiCommand::Resign))).is_empty());
    }

    #[test]
    fn test_simulated_sensor_runs_detection() {
        let mut coordinator = Coordinator::new(RobotGeometry::default());
        coordinator.handle(Input::Ui(UiCommand::SimulateSensor {
            square: "E2".to_string(),
            status: SensorStatus::Lifted,
        }));
        assert_eq!(coordinator.detector().pending(), Some(Square::E2));

        let effects = coordinator.handle(Input::Ui(UiCommand::SimulateSensor {
            square: "x0".to_string(),
            status: SensorStatus::Placed,
        }));
        assert!(matches!(&effects[..], [Effect::Ui(UiEvent::Log { .. })]));
    }

    #[test]
    fn test_stream_error_marks_lichess_offline() {
        let mut coordinator = coordinator_in_game();
        let effects = coordinator.handle(Input::Game {
            game_id: "g1".to_string(),
            event: GameStreamEvent::StreamError("reset by peer".to_string()),
        });
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Ui(UiEvent::Status {
                link: Link::Lichess,
                state: LinkState::Offline
            })
        )));
    }

    #[test]
    fn test_reannounced_game_reopens_ended_stream() {
        let mut coordinator = coordinator_in_game();
        coordinator.handle(update("e2e4"));
        let start = Input::Remote(RemoteEvent::GameStart {
            game: GameRef {
                id: "g1".to_string(),
            },
        });
        let watches = |effects: &[Effect]| {
            effects
                .iter()
                .filter(|e| matches!(e, Effect::WatchGame(id) if id == "g1"))
                .count()
        };

        // Stream still open: nothing to do
        assert!(coordinator.handle(start.clone()).is_empty());

        coordinator.handle(Input::Game {
            game_id: "g1".to_string(),
            event: GameStreamEvent::StreamError("reset by peer".to_string()),
        });
        assert_eq!(watches(&coordinator.handle(start.clone())), 1);
        assert_eq!(coordinator.board().ply_count(), 1);
        assert_eq!(coordinator.session().active_game_id(), Some("g1"));

        coordinator.handle(Input::Game {
            game_id: "g1".to_string(),
            event: GameStreamEvent::Closed,
        });
        assert_eq!(watches(&coordinator.handle(start.clone())), 1);
        assert!(coordinator.handle(start).is_empty());
    }

    #[tokio::test]
    async fn test_submission_without_remote_reports_failure() {
        let (ui, mut ui_rx) = broadcast::channel(16);
        let (motion, _motion_rx) = mpsc::unbounded_channel();
        let (inputs, _inputs_rx) = mpsc::unbounded_channel::<Input>();
        let outputs = Outputs {
            ui,
            motion,
            remote: None,
            inputs: inputs.downgrade(),
        };

        outputs.dispatch(Effect::Submit(Submission::Resign {
            game_id: "g1".to_string(),
        }));
        match ui_rx.recv().await.unwrap() {
            UiEvent::ActionFailed { action, .. } => assert_eq!(action, "resign"),
            other => panic!("expected action_failed, got {other:?}"),
        }
    }
}
