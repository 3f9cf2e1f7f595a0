//! Dashboard WebSocket bridge
//!
//! Each connection gets its own broadcast receiver. Outbound, every
//! coordinator event is sent as one JSON text frame; inbound, text frames
//! are parsed as commands and forwarded. Frames that do not parse are
//! dropped.

use crate::api::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use shared::protocol::UiCommand;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();
    info!("[BACKEND] Dashboard connected");

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("[BACKEND] Dashboard too slow, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("[BACKEND] Failed to encode event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let commands = state.commands.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    let Some(command) = parse_command(text.as_str()) else {
                        continue;
                    };
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!("[BACKEND] Dashboard disconnected");
}

/// Parse one inbound frame.
pub fn parse_command(text: &str) -> Option<UiCommand> {
    match serde_json::from_str(text) {
        Ok(command) => Some(command),
        Err(e) => {
            debug!("[BACKEND] Ignoring frame ({}): {}", e, text);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::SensorStatus;

    #[test]
    fn test_parse_simulate_sensor() {
        assert_eq!(
            parse_command(r#"{"type":"simulate_sensor","square":"e2","status":"0"}"#),
            Some(UiCommand::SimulateSensor {
                square: "e2".to_string(),
                status: SensorStatus::Lifted
            })
        );
    }

    #[test]
    fn test_parse_unit_commands() {
        assert_eq!(parse_command(r#"{"type":"resign"}"#), Some(UiCommand::Resign));
        assert_eq!(parse_command(r#"{"type":"accept_draw"}"#), Some(UiCommand::AcceptDraw));
    }

    #[test]
    fn test_unknown_frames_are_dropped() {
        assert_eq!(parse_command(r#"{"type":"reboot"}"#), None);
        assert_eq!(parse_command("hello"), None);
    }
}
