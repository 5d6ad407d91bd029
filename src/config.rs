//! Server configuration: optional TOML file plus environment overrides.
//!
//! TOML (path in TRAINER_CONFIG_PATH), every key optional:
//!
//! ```toml
//! default_csv_url = "https://docs.google.com/spreadsheets/d/.../pub?output=csv"
//!
//! [bible_api]
//! base_url = "https://rest.api.bible/v1"
//! timeout_secs = 20
//! cache_ttl_secs = 86400
//! cache_max_entries = 256
//!
//! [game]
//! seed = 42
//!
//! [book_codes]
//! "Proverbs" = "PRO"
//! ```
//!
//! Env always wins: BIBLE_API_KEY, BIBLE_API_BASE_URL, DEFAULT_CSV_URL,
//! SETTINGS_PATH, GAME_SEED.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_BIBLE_API_BASE: &str = "https://rest.api.bible/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TrainerConfig {
  #[serde(default)]
  pub default_csv_url: Option<String>,
  #[serde(default)]
  pub settings_path: Option<String>,
  #[serde(default)]
  pub bible_api: BibleApiConfig,
  #[serde(default)]
  pub game: GameConfig,
  #[serde(default)]
  pub book_codes: HashMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BibleApiConfig {
  pub base_url: String,
  /// Server-wide key used when a user has not entered their own. Never logged.
  pub default_api_key: Option<String>,
  pub timeout_secs: u64,
  pub cache_ttl_secs: u64,
  /// Oldest responses are evicted past this many entries.
  pub cache_max_entries: usize,
}

impl Default for BibleApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BIBLE_API_BASE.into(),
      default_api_key: None,
      timeout_secs: DEFAULT_TIMEOUT_SECS,
      cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
      cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GameConfig {
  /// Fixed RNG seed for reproducible blanks and shuffles.
  #[serde(default)]
  pub seed: Option<u64>,
}

impl TrainerConfig {
  /// TOML file (if any) with env overrides applied.
  pub fn load() -> Self {
    let mut cfg = load_config_file_from_env().unwrap_or_default();
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg
  }

  /// Overlay values from a variable lookup. Empty values count as unset.
  pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
    let get = |k: &str| var(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get("BIBLE_API_KEY") {
      self.bible_api.default_api_key = Some(v);
    }
    if let Some(v) = get("BIBLE_API_BASE_URL") {
      self.bible_api.base_url = v;
    }
    if let Some(v) = get("DEFAULT_CSV_URL") {
      self.default_csv_url = Some(v);
    }
    if let Some(v) = get("SETTINGS_PATH") {
      self.settings_path = Some(v);
    }
    if let Some(v) = get("GAME_SEED") {
      match v.parse::<u64>() {
        Ok(seed) => self.game.seed = Some(seed),
        Err(e) => warn!(target: "verse_trainer", value = %v, error = %e, "Ignoring invalid GAME_SEED"),
      }
    }
  }
}

pub fn parse_config(s: &str) -> Result<TrainerConfig, toml::de::Error> {
  toml::from_str::<TrainerConfig>(s)
}

/// Attempt to load `TrainerConfig` from TRAINER_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_file_from_env() -> Option<TrainerConfig> {
  let path = std::env::var("TRAINER_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "verse_trainer", %path, "Loaded trainer config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "verse_trainer", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "verse_trainer", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
