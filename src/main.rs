//! Verse Trainer · Scripture memorization backend
//!
//! - Axum HTTP + WebSocket API; one practice session per WebSocket
//! - Verse list from a published spreadsheet (CSV)
//! - Optional scripture API for playing verses in another Bible version
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   DEFAULT_CSV_URL     : sheet used when the user has not set one
//!   BIBLE_API_KEY       : server-wide scripture API key (users may bring their own)
//!   BIBLE_API_BASE_URL  : default "https://rest.api.bible/v1"
//!   SETTINGS_PATH       : JSON file for persisted settings (in-memory if unset)
//!   GAME_SEED           : fixed RNG seed for reproducible games
//!   TRAINER_CONFIG_PATH : path to TOML config
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod settings;
mod reference;
mod game;
mod session;
mod source;
mod bible_api;
mod resolver;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::TrainerConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: settings store, CSV source, scripture API client, resolver.
  let state = Arc::new(AppState::new(TrainerConfig::load()));

  // Sessions start empty and pick up the sheet once it is published.
  {
    let state = state.clone();
    tokio::spawn(async move {
      state.load_verses().await;
    });
  }

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "verse_trainer", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "verse_trainer", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
