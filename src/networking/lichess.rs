//! Lichess Board API client
//!
//! [`RemoteService`] is the seam the rest of the system talks through;
//! [`LichessClient`] implements it over HTTPS with `reqwest`. Tests swap in
//! an in-memory implementation.
//!
//! The long-lived tasks that keep streams open live here too:
//! [`run_event_stream`] follows the account event stream and reconnects
//! after a fixed delay, [`watch_game`] follows one game's board stream.

use crate::game::events::{Input, Submission};
use crate::networking::error::{LichessError, LichessResult};
use crate::networking::ndjson;
use crate::networking::protocol::{parse_event_line, parse_game_line, GameStreamEvent, RemoteEvent};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use shared::protocol::{Link, LinkState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

pub type EventStream = BoxStream<'static, LichessResult<RemoteEvent>>;
pub type GameStream = BoxStream<'static, LichessResult<GameStreamEvent>>;

#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Own account id.
    async fn account(&self) -> LichessResult<String>;

    async fn stream_events(&self) -> LichessResult<EventStream>;

    async fn stream_game(&self, game_id: &str) -> LichessResult<GameStream>;

    async fn make_move(&self, game_id: &str, uci: &str) -> LichessResult<()>;

    async fn resign(&self, game_id: &str) -> LichessResult<()>;

    async fn draw(&self, game_id: &str, accept: bool) -> LichessResult<()>;

    /// Returns the id of the created challenge.
    async fn challenge(&self, username: &str, limit_secs: u64) -> LichessResult<String>;
}

#[derive(Deserialize)]
struct Account {
    id: String,
}

#[derive(Deserialize)]
struct ChallengeCreated {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    challenge: Option<ChallengeBody>,
}

#[derive(Deserialize)]
struct ChallengeBody {
    id: String,
}

#[derive(Clone)]
pub struct LichessClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl LichessClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> LichessResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("wardom/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn post(&self, path: &str) -> LichessResult<reqwest::Response> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(response).await
    }

    async fn open_lines(&self, path: &str) -> LichessResult<BoxStream<'static, LichessResult<String>>> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .send()
            .await?;
        let response = check(response).await?;
        Ok(ndjson::lines(response.bytes_stream())
            .map(|line| line.map_err(LichessError::from))
            .boxed())
    }
}

async fn check(response: reqwest::Response) -> LichessResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LichessError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

#[async_trait]
impl RemoteService for LichessClient {
    async fn account(&self) -> LichessResult<String> {
        let response = self
            .http
            .get(self.url("account"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let account: Account = check(response).await?.json().await?;
        Ok(account.id)
    }

    async fn stream_events(&self) -> LichessResult<EventStream> {
        let lines = self.open_lines("stream/event").await?;
        Ok(lines
            .filter_map(|line| async move {
                match line {
                    Ok(line) => parse_event_line(&line).map(Ok),
                    Err(e) => Some(Err(e)),
                }
            })
            .boxed())
    }

    async fn stream_game(&self, game_id: &str) -> LichessResult<GameStream> {
        let lines = self
            .open_lines(&format!("board/game/stream/{game_id}"))
            .await?;
        Ok(lines
            .filter_map(|line| async move {
                match line {
                    Ok(line) => parse_game_line(&line).map(Ok),
                    Err(e) => Some(Err(e)),
                }
            })
            .boxed())
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> LichessResult<()> {
        self.post(&format!("board/game/{game_id}/move/{uci}"))
            .await
            .map(drop)
    }

    async fn resign(&self, game_id: &str) -> LichessResult<()> {
        self.post(&format!("board/game/{game_id}/resign"))
            .await
            .map(drop)
    }

    async fn draw(&self, game_id: &str, accept: bool) -> LichessResult<()> {
        let answer = if accept { "yes" } else { "no" };
        self.post(&format!("board/game/{game_id}/draw/{answer}"))
            .await
            .map(drop)
    }

    async fn challenge(&self, username: &str, limit_secs: u64) -> LichessResult<String> {
        let body = json!({
            "clock": { "limit": limit_secs, "increment": 0 },
            "color": "random",
            "variant": "standard",
        });
        let response = self
            .http
            .post(self.url(&format!("challenge/{username}")))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let created: ChallengeCreated = check(response).await?.json().await?;
        Ok(created
            .id
            .or(created.challenge.map(|c| c.id))
            .unwrap_or_default())
    }
}

/// Carry out one submission against the remote service.
pub async fn submit(service: &dyn RemoteService, submission: &Submission) -> LichessResult<()> {
    match submission {
        Submission::Move { game_id, uci } => service.make_move(game_id, uci).await,
        Submission::Resign { game_id } => service.resign(game_id).await,
        Submission::Draw { game_id, accept } => service.draw(game_id, *accept).await,
        Submission::Challenge {
            username,
            limit_secs,
        } => {
            let id = service.challenge(username, *limit_secs).await?;
            info!("[LICHESS] Challenge {} sent to {}", id, username);
            Ok(())
        }
    }
}

fn report(inputs: &UnboundedSender<Input>, state: LinkState) -> bool {
    inputs
        .send(Input::LinkStatus {
            link: Link::Lichess,
            state,
        })
        .is_ok()
}

/// Follow the account event stream forever, reconnecting after `retry` on failure.
///
/// Returns once the coordinator stops accepting inputs.
pub async fn run_event_stream(
    service: Arc<dyn RemoteService>,
    inputs: UnboundedSender<Input>,
    retry: Duration,
) {
    let mut identified = false;
    loop {
        if !identified {
            match service.account().await {
                Ok(id) => {
                    info!("[LICHESS] Logged in as {}", id);
                    identified = true;
                    if inputs.send(Input::Identity(id)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("[LICHESS] Could not fetch account: {}", e),
            }
        }

        match service.stream_events().await {
            Ok(mut events) => {
                info!("[LICHESS] Event stream connected");
                if !report(&inputs, LinkState::Online) {
                    return;
                }
                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) => {
                            if inputs.send(Input::Remote(event)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("[LICHESS] Event stream interrupted: {}", e);
                            break;
                        }
                    }
                }
                debug!("[LICHESS] Event stream ended");
            }
            Err(e) => error!("[LICHESS] Event stream connection failed: {}", e),
        }

        if !report(&inputs, LinkState::Offline) {
            return;
        }
        tokio::time::sleep(retry).await;
    }
}

/// Follow one game's board stream until it ends.
///
/// Transport failures are forwarded as `GameStreamEvent::StreamError`, a
/// clean end of stream as `GameStreamEvent::Closed`.
pub async fn watch_game(service: Arc<dyn RemoteService>, game_id: String, inputs: UnboundedSender<Input>) {
    let send = |event: GameStreamEvent| {
        inputs
            .send(Input::Game {
                game_id: game_id.clone(),
                event,
            })
            .is_ok()
    };

    let mut stream = match service.stream_game(&game_id).await {
        Ok(stream) => stream,
        Err(e) => {
            send(GameStreamEvent::StreamError(e.to_string()));
            return;
        }
    };

    info!("[LICHESS] Watching game {}", game_id);
    while let Some(event) = stream.next().await {
        let event = event.unwrap_or_else(|e| GameStreamEvent::StreamError(e.to_string()));
        let failed = matches!(event, GameStreamEvent::StreamError(_));
        if !send(event) || failed {
            return;
        }
    }
    debug!("[LICHESS] Game stream {} closed", game_id);
    send(GameStreamEvent::Closed);
}
