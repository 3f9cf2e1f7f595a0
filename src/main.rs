use anyhow::Context;
use backend::AppState;
use clap::Parser;
use shared::protocol::{Link, LinkState, UiCommand, UiEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wardom::core::{Config, CoreError};
use wardom::game::{Coordinator, Input, Outputs};
use wardom::hardware::SerialLink;
use wardom::networking::lichess::{self, LichessClient, RemoteService};

/// Dashboard events buffered per socket before a slow reader starts skipping
const UI_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    config.validate()?;

    let (input_tx, input_rx) = mpsc::unbounded_channel::<Input>();
    let (motion_tx, motion_rx) = mpsc::unbounded_channel();
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<UiCommand>();
    let (ui_tx, _) = broadcast::channel::<UiEvent>(UI_BUFFER);

    let remote: Option<Arc<dyn RemoteService>> = match config.token() {
        Some(token) => Some(Arc::new(
            LichessClient::new(&config.lichess_url, token).context("building Lichess client")?,
        )),
        None => {
            warn!("[LICHESS] LICHESS_TOKEN not set, remote play disabled");
            let _ = input_tx.send(Input::LinkStatus {
                link: Link::Lichess,
                state: LinkState::Offline,
            });
            None
        }
    };

    tokio::spawn(
        SerialLink::new(config.serial_port.clone(), config.baud_rate).run(input_tx.clone(), motion_rx),
    );

    if let Some(remote) = remote.clone() {
        tokio::spawn(lichess::run_event_stream(
            remote,
            input_tx.clone(),
            config.reconnect_delay(),
        ));
    }

    // Dashboard commands join the same queue as everything else
    let forward_tx = input_tx.clone();
    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            if forward_tx.send(Input::Ui(command)).is_err() {
                break;
            }
        }
    });

    let outputs = Outputs {
        ui: ui_tx.clone(),
        motion: motion_tx,
        remote,
        inputs: input_tx.downgrade(),
    };
    let coordinator = tokio::spawn(Coordinator::new(config.geometry()).run(input_rx, outputs));
    drop(input_tx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CoreError::Bind {
            port: config.http_port,
            source,
        })?;
    info!("[BACKEND] Dashboard on http://localhost:{}", config.http_port);

    let app = backend::router(AppState::new(command_tx, ui_tx));
    tokio::select! {
        result = axum::serve(listener, app) => result.context("dashboard server stopped")?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    coordinator.abort();
    Ok(())
}
