use axum::{
    extract::ws::{Message, WebSocket},
    extract::{Path, Query, State, WebSocketUpgrade},
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod game;
mod protocol;
mod shared;

use config::GameConfig;
use game::arena::Arena;
use game::constants::OUTBOUND_QUEUE_CAPACITY;

struct AppState {
    arenas: DashMap<String, Arc<Arena>>,
    config: GameConfig,
}

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct ArenaSummary {
    name: String,
    players: usize,
    phase: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = GameConfig::from_env();
    tracing::info!(?config, "loaded game configuration");

    let state = Arc::new(AppState {
        arenas: DashMap::new(),
        config,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app: Router = Router::new()
        .route("/api/health", get(health))
        .route("/api/arenas", get(list_arenas))
        .route("/api/arena/:arena", get(ws_handler))
        .layer(cors)
        .with_state(state);

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8787);

    let address = format!("0.0.0.0:{port}");
    tracing::info!("listening on {address}");

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

impl AppState {
    fn arena(&self, name: String) -> Arc<Arena> {
        match self.arenas.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let arena = Arc::new(Arena::new(self.config));
                entry.insert(arena.clone());
                arena
            }
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(OkResponse { ok: true })
}

async fn list_arenas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let arenas: Vec<ArenaSummary> = state
        .arenas
        .iter()
        .map(|entry| {
            let stats = entry.value().stats();
            ArenaSummary {
                name: entry.key().clone(),
                players: stats.players,
                phase: stats.phase.as_str().to_string(),
            }
        })
        .collect();
    Json(arenas)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(arena): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let trimmed = arena.trim();
    let arena_name = if trimmed.is_empty() { "main" } else { trimmed }.to_string();
    let display_name = params.get("name").cloned();
    let arena = state.arena(arena_name);
    ws.on_upgrade(move |socket| handle_socket(socket, arena, display_name))
}

async fn handle_socket(socket: WebSocket, arena: Arc<Arena>, display_name: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let session_id = uuid::Uuid::new_v4().to_string();
    let (outbound, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);
    arena.connect(session_id.clone(), display_name, outbound);

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            // The core closing our queue (e.g. a rejected registration) ends
            // the connection.
            _ = &mut send_task => break,
            received = receiver.next() => {
                let Some(Ok(message)) = received else { break };
                match message {
                    Message::Text(text) => arena.handle_text_message(&session_id, &text),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    arena.disconnect(&session_id);
    send_task.abort();
}
