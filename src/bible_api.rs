//! Minimal scripture API client (API.Bible v1 shape).
//!
//! Every call is a GET with an `api-key` header. Successful bodies are cached in
//! memory by URL for a fixed TTL, up to a fixed number of entries (oldest evicted
//! first); `clear_cache` drops everything.
//!
//! NOTE: We never log the API key.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::BibleApiConfig;
use crate::error::BibleApiError;
use crate::resolver::ScriptureLookup;
use crate::util::{fill_template, trunc_for_log};

const VERSE_PATH: &str = "/bibles/{bible}/verses/{verse}";
const SEARCH_PATH: &str = "/bibles/{bible}/search";

/// Plain-text verse rendering without notes, titles or numbering.
const VERSE_TEXT_PARAMS: &[(&str, &str)] = &[
  ("content-type", "text"),
  ("include-notes", "false"),
  ("include-titles", "false"),
  ("include-chapter-numbers", "false"),
  ("include-verse-numbers", "false"),
  ("include-verse-spans", "false"),
];

#[derive(Clone)]
pub struct BibleApi {
  client: reqwest::Client,
  base_url: String,
  default_api_key: Option<String>,
  cache_ttl: Duration,
  cache_max: usize,
  cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

struct CacheEntry {
  stored_at: Instant,
  body: serde_json::Value,
}

/// One Bible version as listed by `/bibles`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BibleVersion {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub abbreviation: String,
}

/// `data` of a verse lookup. Only `content` matters for play.
#[derive(Clone, Debug, Deserialize)]
pub struct VersePassage {
  pub content: String,
  #[serde(default)]
  pub reference: Option<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
  data: T,
}

impl BibleApi {
  pub fn new(cfg: &BibleApiConfig) -> Result<Self, BibleApiError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .map_err(|e| BibleApiError::Network(e.to_string()))?;
    let default_api_key = cfg.default_api_key.clone().filter(|k| !k.trim().is_empty());
    Ok(Self {
      client,
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      default_api_key,
      cache_ttl: Duration::from_secs(cfg.cache_ttl_secs),
      cache_max: cfg.cache_max_entries.max(1),
      cache: Arc::new(Mutex::new(HashMap::new())),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn has_default_key(&self) -> bool {
    self.default_api_key.is_some()
  }

  /// The user's key if set, else the server default.
  pub fn effective_key(&self, user_key: &str) -> Option<String> {
    let user_key = user_key.trim();
    if user_key.is_empty() {
      self.default_api_key.clone()
    } else {
      Some(user_key.to_string())
    }
  }

  /// GET `path` with query `params`; cached by full URL.
  #[instrument(level = "info", skip(self, api_key, params), fields(%path))]
  async fn request(
    &self,
    path: &str,
    params: &[(&str, &str)],
    api_key: &str,
  ) -> Result<serde_json::Value, BibleApiError> {
    let key = self.effective_key(api_key).ok_or(BibleApiError::MissingApiKey)?;

    let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
      .map_err(|e| BibleApiError::Malformed(format!("bad request URL: {e}")))?;
    if !params.is_empty() {
      url.query_pairs_mut().extend_pairs(params);
    }
    let cache_key = url.to_string();

    if let Some(body) = self.cached(&cache_key) {
      debug!(target: "verse_trainer", %path, "Scripture API cache hit");
      return Ok(body);
    }

    let start = Instant::now();
    let res = self
      .client
      .get(url)
      .header("api-key", key)
      .header(ACCEPT, "application/json")
      .header(USER_AGENT, "verse-trainer-backend/0.1")
      .send()
      .await
      .map_err(|e| BibleApiError::Network(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_api_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      warn!(target: "verse_trainer", status, %path, "Scripture API returned an error");
      return Err(BibleApiError::Api { status, message });
    }

    let body: serde_json::Value = res.json().await.map_err(|e| BibleApiError::Malformed(e.to_string()))?;
    info!(target: "verse_trainer", elapsed = ?start.elapsed(), %path, "Scripture API response received");
    self.store(cache_key, body.clone());
    Ok(body)
  }

  async fn request_data<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&str, &str)],
    api_key: &str,
  ) -> Result<T, BibleApiError> {
    let body = self.request(path, params, api_key).await?;
    serde_json::from_value::<Envelope<T>>(body)
      .map(|e| e.data)
      .map_err(|e| BibleApiError::Malformed(e.to_string()))
  }

  fn cached(&self, key: &str) -> Option<serde_json::Value> {
    let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
    match cache.get(key) {
      Some(entry) if entry.stored_at.elapsed() < self.cache_ttl => Some(entry.body.clone()),
      Some(_) => {
        cache.remove(key);
        None
      }
      None => None,
    }
  }

  fn store(&self, key: String, body: serde_json::Value) {
    let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
    let ttl = self.cache_ttl;
    cache.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    while cache.len() >= self.cache_max {
      let oldest = cache.iter().min_by_key(|(_, entry)| entry.stored_at).map(|(k, _)| k.clone());
      match oldest {
        Some(k) => {
          cache.remove(&k);
        }
        None => break,
      }
    }
    cache.insert(key, CacheEntry { stored_at: Instant::now(), body });
  }

  #[cfg(test)]
  fn cache_len(&self) -> usize {
    self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
  }

  /// Drop every cached response.
  pub fn clear_cache(&self) -> usize {
    let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
    let n = cache.len();
    cache.clear();
    info!(target: "verse_trainer", entries = n, "Scripture API cache cleared");
    n
  }

  // --- High-level helpers ---

  /// Languages offered by the API, passed through as raw JSON objects.
  pub async fn get_languages(&self, api_key: &str) -> Result<Vec<serde_json::Value>, BibleApiError> {
    self.request_data("/bibles/languages", &[], api_key).await
  }

  pub async fn get_bibles(&self, api_key: &str, language: &str) -> Result<Vec<BibleVersion>, BibleApiError> {
    let language = if language.trim().is_empty() { "eng" } else { language.trim() };
    self.request_data("/bibles", &[("language", language)], api_key).await
  }

  #[instrument(level = "info", skip(self, api_key), fields(%bible_id, %verse_id))]
  pub async fn get_verse(&self, api_key: &str, bible_id: &str, verse_id: &str) -> Result<VersePassage, BibleApiError> {
    let path = fill_template(VERSE_PATH, &[("bible", bible_id), ("verse", verse_id)]);
    self.request_data(&path, VERSE_TEXT_PARAMS, api_key).await
  }

  /// Free-text search, first hit only. Not used by the games.
  pub async fn search_verse(&self, api_key: &str, bible_id: &str, query: &str) -> Result<serde_json::Value, BibleApiError> {
    let path = fill_template(SEARCH_PATH, &[("bible", bible_id)]);
    self.request_data(&path, &[("query", query), ("limit", "1")], api_key).await
  }
}

#[async_trait]
impl ScriptureLookup for BibleApi {
  fn has_key(&self, user_key: &str) -> bool {
    self.effective_key(user_key).is_some()
  }

  async fn verse_text(&self, api_key: &str, bible_id: &str, verse_id: &str) -> Result<String, BibleApiError> {
    let passage = self.get_verse(api_key, bible_id, verse_id).await?;
    debug!(target: "verse_trainer", %verse_id, reference = passage.reference.as_deref().unwrap_or(""), "Verse passage fetched");
    Ok(passage.content)
  }
}

/// Pull `message` out of an API error body, if it has one.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EObj>(body).ok().map(|e| e.message)
}
