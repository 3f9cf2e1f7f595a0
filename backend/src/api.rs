use crate::socket;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use shared::protocol::{TimeField, UiCommand, UiEvent};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    /// Commands for the coordinator
    pub commands: mpsc::UnboundedSender<UiCommand>,
    /// Coordinator events, fanned out to every dashboard socket
    pub events: broadcast::Sender<UiEvent>,
}

impl AppState {
    pub fn new(
        commands: mpsc::UnboundedSender<UiCommand>,
        events: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self { commands, events }
    }
}

#[derive(Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub time: Option<TimeField>,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub queued: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dashboards: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(socket::ws_handler))
        .route("/api/challenge", post(create_challenge))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Queue a challenge; the outcome arrives later over the socket.
async fn create_challenge(
    State(state): State<AppState>,
    Json(payload): Json<ChallengeRequest>,
) -> (StatusCode, Json<ChallengeResponse>) {
    let command = UiCommand::Challenge {
        username: payload.username,
        time: payload.time,
    };
    match state.commands.send(command) {
        Ok(()) => {
            info!("[BACKEND] Challenge queued");
            (StatusCode::ACCEPTED, Json(ChallengeResponse { queued: true }))
        }
        Err(_) => {
            warn!("[BACKEND] Coordinator unavailable, challenge dropped");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ChallengeResponse { queued: false }),
            )
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        dashboards: state.events.receiver_count(),
    })
}
