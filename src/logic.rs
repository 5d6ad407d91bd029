//! Core behaviors behind the WebSocket session loop.
//!
//! This includes:
//!   - starting a verse load (inline when local, spawned when the API is involved)
//!   - applying a client action to a practice session
//!   - reacting to library and settings changes published by `AppState`

use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::domain::ResolvedVerse;
use crate::protocol::{session_message, ClientWsMessage, ServerWsMessage};
use crate::session::{LoadTicket, PracticeSession, SessionError};
use crate::settings::Settings;
use crate::state::{AppState, VerseLibrary};

/// Resolver results travel back to the session loop on this channel.
pub type LoadSender = mpsc::UnboundedSender<(LoadTicket, ResolvedVerse)>;

/// Kick off resolution for `ticket` and describe the session afterwards.
///
/// Local text is applied immediately. Remote text is fetched on a spawned task
/// whose result is sent to `loads`; the session decides on arrival whether it
/// is still wanted.
#[instrument(level = "debug", skip(state, session, loads), fields(ticket = ticket.id, index = ticket.index))]
pub fn begin_load(state: &AppState, session: &mut PracticeSession, ticket: LoadTicket, loads: &LoadSender) -> ServerWsMessage {
  let Some(verse) = session.verse_for(ticket).cloned() else {
    return session_message(session);
  };
  let settings = state.current_settings();

  if !state.resolver.is_remote(&settings) {
    session.complete_load(ticket, ResolvedVerse::local(&verse));
    return session_message(session);
  }

  let resolver = state.resolver.clone();
  let loads = loads.clone();
  tokio::spawn(async move {
    let resolved = resolver.resolve(&verse, &settings).await;
    // the session loop may be gone; nothing to do then
    let _ = loads.send((ticket, resolved));
  });
  session_message(session)
}

/// Same as `begin_load`, for calls that may or may not have produced a ticket.
pub fn maybe_load(
  state: &AppState,
  session: &mut PracticeSession,
  ticket: Option<LoadTicket>,
  loads: &LoadSender,
) -> ServerWsMessage {
  match ticket {
    Some(t) => begin_load(state, session, t, loads),
    None => session_message(session),
  }
}

/// Map a refused session call to the reply the client sees.
fn refused(session: &PracticeSession, err: SessionError) -> ServerWsMessage {
  match err {
    SessionError::NoContent => session_message(session),
    other => {
      debug!(target: "game", reason = %other, "Action ignored");
      ServerWsMessage::Ignored { reason: other.to_string() }
    }
  }
}

fn after<T>(session: &PracticeSession, res: Result<T, SessionError>) -> ServerWsMessage {
  match res {
    Ok(_) => session_message(session),
    Err(e) => refused(session, e),
  }
}

/// Run `action` only if the client's `round` still names the challenge on screen.
fn in_round<T>(
  session: &mut PracticeSession,
  round: u64,
  action: impl FnOnce(&mut PracticeSession) -> Result<T, SessionError>,
) -> ServerWsMessage {
  let res = session.check_round(round).and_then(|()| action(session));
  after(session, res)
}

/// Apply one client message. Always yields exactly one reply.
#[instrument(level = "debug", skip(state, session, loads))]
pub async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session: &mut PracticeSession,
  loads: &LoadSender,
) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Start => {
      let ticket = session.start();
      maybe_load(state, session, ticket, loads)
    }
    ClientWsMessage::Next => {
      let ticket = session.next();
      maybe_load(state, session, ticket, loads)
    }
    ClientWsMessage::Previous => {
      let ticket = session.previous();
      maybe_load(state, session, ticket, loads)
    }
    ClientWsMessage::SelectVerse { index } => match session.select(index) {
      Ok(ticket) => maybe_load(state, session, ticket, loads),
      Err(e) => refused(session, e),
    },

    ClientWsMessage::SetGameType { game_type } => {
      session.set_game_type(game_type);
      session_message(session)
    }
    ClientWsMessage::Reset => {
      let res = session.reset();
      after(session, res)
    }

    ClientWsMessage::SetBlankInput { round, position, text } => {
      in_round(session, round, |s| s.set_blank_input(position, &text))
    }
    ClientWsMessage::PickFromBank { round, bank_index } => in_round(session, round, |s| s.pick_from_bank(bank_index)),
    ClientWsMessage::RemoveFromSelection { round, selection_index } => {
      in_round(session, round, |s| s.remove_from_selection(selection_index))
    }
    ClientWsMessage::MoveWithinSelection { round, from, to } => {
      in_round(session, round, |s| s.move_within_selection(from, to))
    }
    ClientWsMessage::SetInput { round, text } => in_round(session, round, |s| s.set_input(&text)),
    ClientWsMessage::RevealMore { round } => in_round(session, round, PracticeSession::reveal_more),

    ClientWsMessage::CheckAnswer { round } => in_round(session, round, |s| {
      let r = s.check_answer()?;
      info!(target: "game", index = s.index(), game = s.game_type().as_str(), correct = r.is_correct, "Answer checked");
      Ok(r)
    }),
    ClientWsMessage::ToggleAnswer { round } => in_round(session, round, PracticeSession::toggle_answer),

    // Reload side effects arrive through the library/settings watchers.
    ClientWsMessage::SaveSettings { settings } => match state.update_settings(settings).await {
      Ok(saved) => ServerWsMessage::Settings { settings: saved.redacted() },
      Err(e) => ServerWsMessage::Error { message: format!("Failed to save settings: {e}") },
    },
  }
}

/// A new verse list was published: start over on its first verse.
pub fn on_library_changed(
  state: &AppState,
  session: &mut PracticeSession,
  library: VerseLibrary,
  loads: &LoadSender,
) -> ServerWsMessage {
  let ticket = session.replace_verses(library.verses);
  match (&ticket, library.error) {
    (None, Some(banner)) => ServerWsMessage::Empty { message: banner },
    _ => maybe_load(state, session, ticket, loads),
  }
}

/// Settings changed. Hints apply to the next build; a different text source
/// (API on/off, Bible version, key) reloads the current verse.
pub fn on_settings_changed(
  state: &AppState,
  session: &mut PracticeSession,
  old: &Settings,
  new: &Settings,
  loads: &LoadSender,
) -> Option<ServerWsMessage> {
  session.set_show_hints(new.show_hints);
  let source_changed = old.use_api_version != new.use_api_version
    || old.selected_bible_id != new.selected_bible_id
    || old.bible_api_key != new.bible_api_key;
  if !source_changed {
    return None;
  }
  let ticket = session.start();
  Some(maybe_load(state, session, ticket, loads))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BibleApiConfig, TrainerConfig};
  use crate::domain::{GameType, Verse, VerseSourceKind};
  use crate::game::Challenge;
  use crate::session::{session_rng, Phase};
  use std::sync::Arc;
  use std::time::Duration;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn verse(id: &str, text: &str, reference: &str) -> Verse {
    Verse { id: id.into(), text: text.into(), reference: reference.into(), version: "KJV".into() }
  }

  fn verses() -> Arc<Vec<Verse>> {
    Arc::new(vec![
      verse("verse-1", "Jesus wept.", "John 11:35"),
      verse("verse-2", "Rejoice in the Lord always: and again I say, Rejoice.", "Philippians 4:4"),
    ])
  }

  type Loads = mpsc::UnboundedReceiver<(LoadTicket, ResolvedVerse)>;

  fn setup() -> (AppState, PracticeSession, LoadSender, Loads) {
    let state = AppState::new(TrainerConfig::default());
    let session = PracticeSession::new(verses(), GameType::Typing, true, session_rng(Some(3)));
    let (tx, rx) = mpsc::unbounded_channel();
    (state, session, tx, rx)
  }

  fn round(session: &PracticeSession) -> u64 {
    session.round_id().expect("a challenge on screen")
  }

  fn typed(session: &PracticeSession) -> &str {
    match session.phase() {
      Phase::Ready(r) => match &r.challenge {
        Challenge::Typing(t) => t.input(),
        other => panic!("unexpected challenge: {other:?}"),
      },
      other => panic!("unexpected phase: {other:?}"),
    }
  }

  #[tokio::test]
  async fn local_loads_complete_inline() {
    let (state, mut session, tx, mut rx) = setup();
    let reply = handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    assert!(matches!(reply, ServerWsMessage::State { .. }));
    assert!(matches!(session.phase(), Phase::Ready(_)));
    assert!(rx.try_recv().is_err(), "nothing should be spawned for local text");
  }

  #[tokio::test]
  async fn play_through_typing_round() {
    let (state, mut session, tx, _rx) = setup();
    handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    let r = round(&session);
    handle_client_ws(ClientWsMessage::SetInput { round: r, text: "jesus wept".into() }, &state, &mut session, &tx).await;
    match handle_client_ws(ClientWsMessage::CheckAnswer { round: r }, &state, &mut session, &tx).await {
      ServerWsMessage::State { state } => assert_eq!(state.result.map(|r| r.is_correct), Some(true)),
      other => panic!("unexpected reply: {other:?}"),
    }
  }

  #[tokio::test]
  async fn wrong_game_action_is_ignored() {
    let (state, mut session, tx, _rx) = setup();
    handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    let msg = ClientWsMessage::PickFromBank { round: round(&session), bank_index: 0 };
    let reply = handle_client_ws(msg, &state, &mut session, &tx).await;
    assert!(matches!(reply, ServerWsMessage::Ignored { .. }));
  }

  #[tokio::test]
  async fn navigation_past_the_end_keeps_state() {
    let (state, mut session, tx, _rx) = setup();
    handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    handle_client_ws(ClientWsMessage::Next, &state, &mut session, &tx).await;
    assert_eq!(session.index(), 1);
    let r = round(&session);
    handle_client_ws(ClientWsMessage::SetInput { round: r, text: "partial".into() }, &state, &mut session, &tx).await;
    handle_client_ws(ClientWsMessage::Next, &state, &mut session, &tx).await;
    assert_eq!(session.index(), 1);
    assert_eq!(round(&session), r);
    assert_eq!(typed(&session), "partial");
  }

  #[tokio::test]
  async fn input_for_a_replaced_verse_is_ignored() {
    let (state, mut session, tx, _rx) = setup();
    handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    let old = round(&session);

    let lib = VerseLibrary { verses: Arc::new(vec![verse("verse-1", "God is love.", "1 John 4:8")]), error: None };
    assert!(matches!(on_library_changed(&state, &mut session, lib, &tx), ServerWsMessage::State { .. }));

    let late = ClientWsMessage::SetInput { round: old, text: "jesus wept".into() };
    assert!(matches!(handle_client_ws(late, &state, &mut session, &tx).await, ServerWsMessage::Ignored { .. }));
    assert_eq!(typed(&session), "");
    let late_check = ClientWsMessage::CheckAnswer { round: old };
    assert!(matches!(handle_client_ws(late_check, &state, &mut session, &tx).await, ServerWsMessage::Ignored { .. }));

    let current = ClientWsMessage::SetInput { round: round(&session), text: "god is love".into() };
    assert!(matches!(handle_client_ws(current, &state, &mut session, &tx).await, ServerWsMessage::State { .. }));
    assert_eq!(typed(&session), "god is love");
  }

  #[tokio::test]
  async fn input_for_a_reset_challenge_is_ignored() {
    let (state, mut session, tx, _rx) = setup();
    handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    let old = round(&session);
    handle_client_ws(ClientWsMessage::Reset, &state, &mut session, &tx).await;

    let reply = handle_client_ws(ClientWsMessage::RevealMore { round: old }, &state, &mut session, &tx).await;
    match reply {
      ServerWsMessage::Ignored { reason } => assert!(reason.contains("round"), "{reason}"),
      other => panic!("unexpected reply: {other:?}"),
    }
  }

  #[tokio::test]
  async fn empty_library_with_banner_reports_it() {
    let (state, mut session, tx, _rx) = setup();
    let lib = VerseLibrary { verses: Arc::default(), error: Some("boom".into()) };
    match on_library_changed(&state, &mut session, lib, &tx) {
      ServerWsMessage::Empty { message } => assert_eq!(message, "boom"),
      other => panic!("unexpected reply: {other:?}"),
    }
    let reply = handle_client_ws(ClientWsMessage::CheckAnswer { round: 1 }, &state, &mut session, &tx).await;
    assert!(matches!(reply, ServerWsMessage::Empty { .. }));
  }

  #[tokio::test]
  async fn hint_only_changes_do_not_reload() {
    let (state, mut session, tx, _rx) = setup();
    handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await;
    let old = Settings::default();
    let new = Settings { show_hints: false, ..Settings::default() };
    assert!(on_settings_changed(&state, &mut session, &old, &new, &tx).is_none());
    assert!(!session.show_hints());

    let new_source = Settings { use_api_version: true, ..new.clone() };
    assert!(on_settings_changed(&state, &mut session, &new, &new_source, &tx).is_some());
  }

  async fn scripture_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/bibles/kjv/verses/JHN.11.35"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({ "data": { "content": "Jesus wept. (API)" } }))
          .set_delay(Duration::from_millis(300)),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/bibles/kjv/verses/PHP.4.4"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": { "content": "Rejoice in the Lord alway. (API)" } })),
      )
      .mount(&server)
      .await;
    server
  }

  #[tokio::test]
  async fn remote_loads_arrive_later_and_stale_ones_are_dropped() {
    let server = scripture_server().await;
    let cfg = TrainerConfig {
      bible_api: BibleApiConfig { base_url: server.uri(), default_api_key: Some("k".into()), ..BibleApiConfig::default() },
      ..TrainerConfig::default()
    };
    let state = AppState::new(cfg);
    let api_on = Settings { use_api_version: true, selected_bible_id: "kjv".into(), ..state.current_settings() };
    state.update_settings(api_on).await.unwrap();

    let mut session = PracticeSession::new(verses(), GameType::Typing, true, session_rng(Some(3)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    match handle_client_ws(ClientWsMessage::Start, &state, &mut session, &tx).await {
      ServerWsMessage::Loading { index, total, reference } => {
        assert_eq!((index, total), (0, 2));
        assert_eq!(reference, "John 11:35");
      }
      other => panic!("expected loading, got {other:?}"),
    }
    let reply = handle_client_ws(ClientWsMessage::Next, &state, &mut session, &tx).await;
    assert!(matches!(reply, ServerWsMessage::Loading { index: 1, .. }));

    // the fast fetch for verse 2 lands first; the slow one for verse 1 is stale by then
    for _ in 0..2 {
      let (ticket, resolved) = rx.recv().await.expect("resolver result");
      assert_eq!(resolved.source, VerseSourceKind::Api);
      let applied = session.complete_load(ticket, resolved);
      assert_eq!(applied, ticket.index == 1, "ticket for index {} applied={applied}", ticket.index);
    }

    match session_message(&session) {
      ServerWsMessage::State { state } => {
        assert_eq!(state.index, 1);
        assert_eq!(state.source, VerseSourceKind::Api);
        assert_eq!(state.version, "kjv");
      }
      other => panic!("expected state, got {other:?}"),
    }
    let r = round(&session);
    let reply = handle_client_ws(
      ClientWsMessage::SetInput { round: r, text: "rejoice in the lord alway (api)".into() },
      &state,
      &mut session,
      &tx,
    )
    .await;
    assert!(matches!(reply, ServerWsMessage::State { .. }));
  }
}
