//! HTTP endpoint handlers. Thin wrappers over `AppState` and the scripture API client.
//! Each handler is instrumented; API keys never appear in span fields.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument, warn};

use crate::bible_api::BibleApi;
use crate::error::BibleApiError;
use crate::protocol::*;
use crate::settings::Settings;
use crate::state::AppState;

type ApiFailure = (StatusCode, Json<ErrorOut>);

fn failure(status: StatusCode, error: impl Into<String>) -> ApiFailure {
  (status, Json(ErrorOut { error: error.into() }))
}

fn api_client(state: &AppState) -> Result<&BibleApi, ApiFailure> {
  state
    .bible_api
    .as_ref()
    .ok_or_else(|| failure(StatusCode::SERVICE_UNAVAILABLE, "Scripture API client unavailable"))
}

fn api_failure(e: BibleApiError) -> ApiFailure {
  warn!(target: "verse_trainer", error = %e, "Scripture API request failed");
  match e {
    BibleApiError::MissingApiKey => failure(StatusCode::BAD_REQUEST, "No API key configured"),
    other => failure(StatusCode::BAD_GATEWAY, other.to_string()),
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

fn verses_out(state: &AppState) -> Json<VersesOut> {
  let lib = state.current_library();
  Json(VersesOut { count: lib.verses.len(), verses: lib.verses.to_vec(), error: lib.error })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_verses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  verses_out(&state)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_reload_verses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let lib = state.load_verses().await;
  info!(target: "verse_trainer", count = lib.verses.len(), "HTTP verse reload done");
  verses_out(&state)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.current_settings().redacted())
}

#[instrument(level = "info", skip(state, body), fields(use_api_version = body.use_api_version, bible_id = %body.selected_bible_id))]
pub async fn http_put_settings(
  State(state): State<Arc<AppState>>,
  Json(body): Json<Settings>,
) -> Result<Json<Settings>, ApiFailure> {
  let saved = state
    .update_settings(body)
    .await
    .map_err(|e| failure(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to save settings: {e}")))?;
  Ok(Json(saved.redacted()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, ApiFailure> {
  let defaults = state
    .reset_settings()
    .await
    .map_err(|e| failure(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to reset settings: {e}")))?;
  Ok(Json(defaults.redacted()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_languages(State(state): State<Arc<AppState>>) -> Result<Json<LanguagesOut>, ApiFailure> {
  let api = api_client(&state)?;
  let key = state.current_settings().bible_api_key;
  let languages = api.get_languages(&key).await.map_err(api_failure)?;
  info!(target: "verse_trainer", count = languages.len(), "HTTP languages served");
  Ok(Json(LanguagesOut { languages }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_bibles(
  State(state): State<Arc<AppState>>,
  Query(q): Query<BiblesQuery>,
) -> Result<Json<BiblesOut>, ApiFailure> {
  let api = api_client(&state)?;
  let settings = state.current_settings();
  let language = q.language.unwrap_or(settings.selected_language);
  let bibles = api.get_bibles(&settings.bible_api_key, &language).await.map_err(api_failure)?;
  info!(target: "verse_trainer", %language, count = bibles.len(), "HTTP bibles served");
  Ok(Json(BiblesOut { bibles }))
}

#[instrument(level = "info", skip(state), fields(query_len = q.query.len()))]
pub async fn http_get_search(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SearchQuery>,
) -> Result<Json<SearchOut>, ApiFailure> {
  let api = api_client(&state)?;
  let settings = state.current_settings();
  let bible_id = q.bible_id.unwrap_or(settings.selected_bible_id);
  if bible_id.trim().is_empty() {
    return Err(failure(StatusCode::BAD_REQUEST, "No Bible version selected"));
  }
  let data = api.search_verse(&settings.bible_api_key, &bible_id, &q.query).await.map_err(api_failure)?;
  Ok(Json(SearchOut { data }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let cleared = state.bible_api.as_ref().map(BibleApi::clear_cache).unwrap_or(0);
  Json(CacheClearedOut { cleared })
}
