use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use pacmaze::config::{GameConfig, ServerConfig};
use pacmaze::maze::MazeView;
use pacmaze::runtime::spawn_session;
use pacmaze::server_protocol::{parse_client_message, ParsedClientMessage};
use pacmaze::types::Direction;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const CLIENT_QUEUE: usize = 256;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    config: GameConfig,
    maze: Option<MazeView>,
    inputs: Option<mpsc::Sender<Direction>>,
    restart: Arc<Notify>,
}

impl ServerState {
    fn new(config: GameConfig) -> Self {
        Self {
            clients: HashMap::new(),
            config,
            maze: None,
            inputs: None,
            restart: Arc::new(Notify::new()),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = Arc::new(Mutex::new(ServerState::new(config.game.clone())));
    tokio::spawn(run_sessions(state.clone()));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error!(%error, %bind_addr, "failed to bind server socket");
            std::process::exit(1);
        }
    };

    info!(port = config.port, "listening");
    if let Err(error) = axum::serve(listener, app).await {
        error!(%error, "server runtime failed");
        std::process::exit(1);
    }
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Hosts one session at a time. A finished session waits for `restart`;
/// a running one is stopped by it.
async fn run_sessions(state: SharedState) {
    let (config, restart) = {
        let guard = state.lock().await;
        (guard.config.clone(), Arc::clone(&guard.restart))
    };

    loop {
        let mut handle = match spawn_session(config.clone()) {
            Ok(handle) => handle,
            Err(error) => {
                error!(%error, "failed to start session");
                return;
            }
        };
        {
            let mut guard = state.lock().await;
            guard.inputs = Some(handle.input_sender());
            guard.maze = Some(handle.layout().to_view());
            let init = init_message(&guard);
            broadcast(&mut guard, &init, QueuePolicy::DisconnectOnFull);
        }
        info!(seed = config.seed, "session started");

        let mut restarted = false;
        loop {
            tokio::select! {
                snapshot = handle.next_snapshot() => {
                    let Some(snapshot) = snapshot else {
                        break;
                    };
                    let mut guard = state.lock().await;
                    broadcast(
                        &mut guard,
                        &json!({ "type": "state", "snapshot": snapshot }),
                        QueuePolicy::DropOnFull,
                    );
                }
                _ = restart.notified(), if !restarted => {
                    info!("restart requested");
                    restarted = true;
                    handle.stop();
                }
            }
        }

        let result = handle.finish().await;
        {
            let mut guard = state.lock().await;
            guard.inputs = None;
            match result {
                Ok(summary) => {
                    info!(
                        points = summary.total_points,
                        level = summary.level_reached,
                        "session finished"
                    );
                    broadcast(
                        &mut guard,
                        &json!({ "type": "game_over", "summary": summary }),
                        QueuePolicy::DisconnectOnFull,
                    );
                }
                Err(error) => warn!(%error, "session ended abnormally"),
            }
        }

        if !restarted {
            restart.notified().await;
        }
    }
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(CLIENT_QUEUE);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        let init = init_message(&guard);
        send_to_client(&mut guard, &client_id, &init, QueuePolicy::DisconnectOnFull);
    }
    debug!(%client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(&state, &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.lock().await.clients.remove(&client_id);
    debug!(%client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(parsed) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match parsed {
        ParsedClientMessage::Input { dir } => {
            let Some(inputs) = guard.inputs.as_ref() else {
                debug!(%client_id, ?dir, "input without a running session");
                return;
            };
            if inputs.try_send(dir).is_err() {
                debug!(%client_id, ?dir, "input dropped");
            }
        }
        ParsedClientMessage::Restart => guard.restart.notify_one(),
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({ "type": "pong", "t": t }),
                QueuePolicy::DropOnFull,
            );
        }
    }
}

fn init_message(state: &ServerState) -> Value {
    json!({
        "type": "init",
        "config": state.config,
        "maze": state.maze,
    })
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

fn disconnect_client(state: &mut ServerState, client_id: &str) {
    if let Some(client) = state.clients.remove(client_id) {
        warn!(%client_id, "client queue full, disconnecting");
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: 1013,
            reason: "client too slow".to_string(),
        });
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({ "type": "error", "message": message }),
        QueuePolicy::DropOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{id}")
}
