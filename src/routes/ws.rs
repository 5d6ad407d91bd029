//! WebSocket upgrade + per-connection practice loop.
//!
//! Each connection owns one `PracticeSession`. The loop waits on four things:
//! client frames, finished verse loads, a republished verse library and
//! changed settings. Every client frame gets exactly one JSON reply; the other
//! events push an update when the visible state changed.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::domain::GameType;
use crate::logic::{handle_client_ws, on_library_changed, on_settings_changed};
use crate::protocol::{session_message, ClientWsMessage, ServerWsMessage};
use crate::session::{session_rng, PracticeSession};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "verse_trainer", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

fn encode(msg: &ServerWsMessage) -> String {
  serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip(socket, state), fields(session_id = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let mut library_rx = state.library.subscribe();
  let mut settings_rx = state.settings.subscribe();

  let library = library_rx.borrow_and_update().clone();
  let mut settings = settings_rx.borrow_and_update().clone();
  let mut session = PracticeSession::new(
    library.verses,
    GameType::default(),
    settings.show_hints,
    session_rng(state.config.game.seed),
  );
  let (loads_tx, mut loads_rx) = mpsc::unbounded_channel();
  info!(target: "verse_trainer", verses = session.verse_count(), "WebSocket connected");

  loop {
    let reply = tokio::select! {
      frame = socket.recv() => {
        let Some(Ok(frame)) = frame else { break };
        match frame {
          Message::Text(txt) => Some(match serde_json::from_str::<ClientWsMessage>(&txt) {
            Ok(incoming) => {
              debug!(target: "verse_trainer", "WS received: {:?}", &incoming);
              handle_client_ws(incoming, &state, &mut session, &loads_tx).await
            }
            Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
          }),
          Message::Ping(payload) => {
            let _ = socket.send(Message::Pong(payload)).await;
            None
          }
          Message::Close(_) => break,
          _ => None,
        }
      }

      Some((ticket, resolved)) = loads_rx.recv() => {
        session.complete_load(ticket, resolved).then(|| session_message(&session))
      }

      changed = library_rx.changed() => {
        if changed.is_err() { break }
        let library = library_rx.borrow_and_update().clone();
        info!(target: "verse_trainer", verses = library.verses.len(), "Verse library changed; restarting session");
        Some(on_library_changed(&state, &mut session, library, &loads_tx))
      }

      changed = settings_rx.changed() => {
        if changed.is_err() { break }
        let new = settings_rx.borrow_and_update().clone();
        let reply = on_settings_changed(&state, &mut session, &settings, &new, &loads_tx);
        settings = new;
        reply
      }
    };

    let Some(reply) = reply else { continue };
    if let Err(e) = socket.send(Message::Text(encode(&reply))).await {
      error!(target: "verse_trainer", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "verse_trainer", "WebSocket disconnected");
}
