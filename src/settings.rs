//! User settings and the key/value store they are persisted in.
//!
//! The store keeps JSON values by key. With a backing file (SETTINGS_PATH) every
//! write is flushed to disk; without one it lives in memory for the process.

use std::{collections::HashMap, fmt, path::PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{error, info, warn};

/// Key under which the user settings object is stored.
pub const SETTINGS_KEY: &str = "bibleVerseSettings";

/// Stands in for the API key in everything sent to clients.
pub const REDACTED_KEY: &str = "********";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub csv_url: String,
  pub use_api_version: bool,
  pub bible_api_key: String,
  pub selected_bible_id: String,
  pub selected_language: String,
  pub show_hints: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      csv_url: String::new(),
      use_api_version: false,
      bible_api_key: String::new(),
      selected_bible_id: String::new(),
      selected_language: "eng".into(),
      show_hints: true,
    }
  }
}

// Settings end up in spans and debug logs; the key must not.
impl fmt::Debug for Settings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Settings")
      .field("csv_url", &self.csv_url)
      .field("use_api_version", &self.use_api_version)
      .field("bible_api_key", &if self.bible_api_key.is_empty() { "" } else { REDACTED_KEY })
      .field("selected_bible_id", &self.selected_bible_id)
      .field("selected_language", &self.selected_language)
      .field("show_hints", &self.show_hints)
      .finish()
  }
}

impl Settings {
  /// Fill an empty CSV URL with the server default.
  pub fn with_default_csv(mut self, default_csv_url: Option<&str>) -> Self {
    if self.csv_url.trim().is_empty() {
      if let Some(url) = default_csv_url {
        self.csv_url = url.to_string();
      }
    }
    self
  }

  /// Copy safe to hand back to clients: the API key is replaced by a marker.
  pub fn redacted(&self) -> Self {
    let mut out = self.clone();
    if !out.bible_api_key.is_empty() {
      out.bible_api_key = REDACTED_KEY.into();
    }
    out
  }

  /// A client echoing back the redacted marker means "keep the key you have".
  pub fn restore_key(mut self, current: &Settings) -> Self {
    if self.bible_api_key == REDACTED_KEY {
      self.bible_api_key = current.bible_api_key.clone();
    }
    self
  }
}

/// Opaque key/value store of JSON values.
#[derive(Debug, Default)]
pub struct SettingsStore {
  path: Option<PathBuf>,
  values: HashMap<String, serde_json::Value>,
}

impl SettingsStore {
  pub fn in_memory() -> Self {
    Self::default()
  }

  /// Open a file-backed store. A missing or unreadable file starts empty.
  pub fn open(path: PathBuf) -> Self {
    let values = match std::fs::read_to_string(&path) {
      Ok(s) => match serde_json::from_str::<HashMap<String, serde_json::Value>>(&s) {
        Ok(v) => {
          info!(target: "verse_trainer", path = %path.display(), keys = v.len(), "Loaded settings store");
          v
        }
        Err(e) => {
          error!(target: "verse_trainer", path = %path.display(), error = %e, "Settings file is not valid JSON; starting empty");
          HashMap::new()
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
      Err(e) => {
        error!(target: "verse_trainer", path = %path.display(), error = %e, "Failed to read settings file; starting empty");
        HashMap::new()
      }
    };
    Self { path: Some(path), values }
  }

  /// Typed read. A stored value of the wrong shape reads as `None`.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = self.values.get(key)?.clone();
    match serde_json::from_value(value) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(target: "verse_trainer", %key, error = %e, "Stored value has unexpected shape; ignoring");
        None
      }
    }
  }

  pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), String> {
    let json = serde_json::to_value(value).map_err(|e| e.to_string())?;
    self.values.insert(key.to_string(), json);
    self.flush()
  }

  pub fn remove(&mut self, key: &str) -> Result<(), String> {
    if self.values.remove(key).is_some() {
      self.flush()?;
    }
    Ok(())
  }

  fn flush(&self) -> Result<(), String> {
    let Some(path) = &self.path else {
      return Ok(());
    };
    let body = serde_json::to_string_pretty(&self.values).map_err(|e| e.to_string())?;
    std::fs::write(path, body).map_err(|e| format!("failed to write {}: {e}", path.display()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_first_run_settings() {
    let s = Settings::default();
    assert_eq!(s.selected_language, "eng");
    assert!(s.show_hints);
    assert!(!s.use_api_version);
  }

  #[test]
  fn camel_case_json_with_missing_fields_uses_defaults() {
    let s: Settings = serde_json::from_str(r#"{"csvUrl":"https://x/y.csv","useApiVersion":true}"#).unwrap();
    assert_eq!(s.csv_url, "https://x/y.csv");
    assert!(s.use_api_version);
    assert!(s.show_hints);
    assert_eq!(s.selected_language, "eng");

    let json = serde_json::to_value(&s).unwrap();
    assert!(json.get("selectedBibleId").is_some());
    assert!(json.get("selected_bible_id").is_none());
  }

  #[test]
  fn default_csv_only_fills_empty_url() {
    let s = Settings::default().with_default_csv(Some("https://d/v.csv"));
    assert_eq!(s.csv_url, "https://d/v.csv");
    let s = Settings { csv_url: "mine".into(), ..Settings::default() }.with_default_csv(Some("https://d/v.csv"));
    assert_eq!(s.csv_url, "mine");
  }

  #[test]
  fn debug_output_hides_key() {
    let s = Settings { bible_api_key: "top-secret".into(), ..Settings::default() };
    assert!(!format!("{s:?}").contains("top-secret"));
  }

  #[test]
  fn redacted_hides_key() {
    let s = Settings { bible_api_key: "secret".into(), ..Settings::default() };
    assert_eq!(s.redacted().bible_api_key, "********");
    assert_eq!(Settings::default().redacted().bible_api_key, "");
  }

  #[test]
  fn file_store_round_trips_through_disk() {
    let path = std::env::temp_dir().join(format!("verse-trainer-settings-{}.json", uuid::Uuid::new_v4()));
    let settings = Settings { selected_bible_id: "kjv1".into(), show_hints: false, ..Settings::default() };

    let mut store = SettingsStore::open(path.clone());
    assert!(store.get::<Settings>(SETTINGS_KEY).is_none());
    store.set(SETTINGS_KEY, &settings).unwrap();

    let reopened = SettingsStore::open(path.clone());
    assert_eq!(reopened.get::<Settings>(SETTINGS_KEY), Some(settings));

    let mut reopened = reopened;
    reopened.remove(SETTINGS_KEY).unwrap();
    assert!(SettingsStore::open(path.clone()).get::<Settings>(SETTINGS_KEY).is_none());
    let _ = std::fs::remove_file(path);
  }

  #[test]
  fn wrong_shape_reads_as_none() {
    let mut store = SettingsStore::in_memory();
    store.set("darkMode", &true).unwrap();
    assert_eq!(store.get::<bool>("darkMode"), Some(true));
    assert!(store.get::<Settings>("darkMode").is_none());
  }
}
