use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::ServerState;

const GAME_NAME: &str = "tilerush";

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    game: &'static str,
    players: usize,
    timestamp: u64,
}

pub fn router(state: ServerState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn serve(state: ServerState, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Health endpoint listening on port {port}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health(State(state): State<ServerState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        game: GAME_NAME,
        players: state.player_count(),
        timestamp: unix_millis(),
    })
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
