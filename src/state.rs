//! Application state shared by every connection: verse library, settings, services.
//!
//! This module owns:
//!   - the loaded verse list and its load-error banner (published on a watch channel)
//!   - the user settings (watch channel + key/value store for persistence)
//!   - the CSV source, the optional scripture API client and the verse resolver
//!
//! Sessions subscribe to both channels so a reloaded sheet or a changed Bible
//! version reaches every open practice session.

use std::{path::PathBuf, sync::Arc};

use tokio::sync::{watch, Mutex};
use tracing::{error, info, instrument, warn};

use crate::bible_api::BibleApi;
use crate::config::TrainerConfig;
use crate::domain::Verse;
use crate::reference::BookCodes;
use crate::resolver::{ScriptureLookup, VerseResolver};
use crate::settings::{Settings, SettingsStore, SETTINGS_KEY};
use crate::source::CsvSource;

pub const NO_VERSES_BANNER: &str = "No verses found in CSV. Please check the format.";
pub const LOAD_FAILED_BANNER: &str = "Failed to load verses. Please check the CSV URL.";

/// Snapshot of the verse list and the banner to show with it.
#[derive(Clone, Debug, Default)]
pub struct VerseLibrary {
  pub verses: Arc<Vec<Verse>>,
  pub error: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
  pub config: TrainerConfig,
  pub csv: Option<CsvSource>,
  pub bible_api: Option<BibleApi>,
  pub resolver: VerseResolver,
  pub library: Arc<watch::Sender<VerseLibrary>>,
  pub settings: Arc<watch::Sender<Settings>>,
  store: Arc<Mutex<SettingsStore>>,
}

impl AppState {
  /// Build state from config: open the settings store, build HTTP clients and the resolver.
  #[instrument(level = "info", skip_all)]
  pub fn new(config: TrainerConfig) -> Self {
    let store = match &config.settings_path {
      Some(p) => SettingsStore::open(PathBuf::from(p)),
      None => SettingsStore::in_memory(),
    };
    let settings = store
      .get::<Settings>(SETTINGS_KEY)
      .unwrap_or_default()
      .with_default_csv(config.default_csv_url.as_deref());

    let csv = match CsvSource::new() {
      Ok(c) => Some(c),
      Err(e) => {
        error!(target: "verse_trainer", error = %e, "Failed to build CSV HTTP client; sheet loading disabled");
        None
      }
    };

    let bible_api = match BibleApi::new(&config.bible_api) {
      Ok(api) => {
        info!(target: "verse_trainer", base_url = %api.base_url(), default_key = api.has_default_key(), "Scripture API client ready");
        Some(api)
      }
      Err(e) => {
        error!(target: "verse_trainer", error = %e, "Failed to build scripture API client; using sheet text only");
        None
      }
    };

    let lookup = bible_api.clone().map(|api| Arc::new(api) as Arc<dyn ScriptureLookup>);
    let resolver = VerseResolver::new(lookup, BookCodes::with_overrides(config.book_codes.clone()));

    let (library, _) = watch::channel(VerseLibrary::default());
    let (settings_tx, _) = watch::channel(settings);

    Self {
      config,
      csv,
      bible_api,
      resolver,
      library: Arc::new(library),
      settings: Arc::new(settings_tx),
      store: Arc::new(Mutex::new(store)),
    }
  }

  pub fn current_settings(&self) -> Settings {
    self.settings.borrow().clone()
  }

  pub fn current_library(&self) -> VerseLibrary {
    self.library.borrow().clone()
  }

  /// Fetch the sheet named in the settings and publish the result.
  /// Failures leave an empty list plus a banner; they are never fatal.
  #[instrument(level = "info", skip(self))]
  pub async fn load_verses(&self) -> VerseLibrary {
    let url = self.current_settings().csv_url;
    let library = if url.trim().is_empty() {
      VerseLibrary::default()
    } else {
      match &self.csv {
        None => VerseLibrary { verses: Arc::default(), error: Some(LOAD_FAILED_BANNER.into()) },
        Some(csv) => match csv.fetch(&url).await {
          Ok(verses) if verses.is_empty() => {
            warn!(target: "verse_trainer", "Sheet loaded but contained no verses");
            VerseLibrary { verses: Arc::default(), error: Some(NO_VERSES_BANNER.into()) }
          }
          Ok(verses) => VerseLibrary { verses: Arc::new(verses), error: None },
          Err(e) => {
            error!(target: "verse_trainer", error = %e, "Failed to load verses");
            VerseLibrary { verses: Arc::default(), error: Some(LOAD_FAILED_BANNER.into()) }
          }
        },
      }
    };
    info!(target: "verse_trainer", count = library.verses.len(), has_error = library.error.is_some(), "Verse library published");
    self.library.send_replace(library.clone());
    library
  }

  /// Persist and publish new settings; reload the sheet when its URL changed.
  #[instrument(level = "info", skip_all)]
  pub async fn update_settings(&self, new: Settings) -> Result<Settings, String> {
    // Held until published so the stored and published orders agree.
    let mut store = self.store.lock().await;
    let new = new
      .restore_key(&self.settings.borrow())
      .with_default_csv(self.config.default_csv_url.as_deref());
    store.set(SETTINGS_KEY, &new)?;
    let old = self.settings.send_replace(new.clone());
    drop(store);
    info!(
      target: "verse_trainer",
      use_api_version = new.use_api_version,
      bible_id = %new.selected_bible_id,
      show_hints = new.show_hints,
      "Settings updated"
    );
    if old.csv_url != new.csv_url {
      self.load_verses().await;
    }
    Ok(new)
  }

  /// Forget stored settings and go back to defaults.
  #[instrument(level = "info", skip_all)]
  pub async fn reset_settings(&self) -> Result<Settings, String> {
    let mut store = self.store.lock().await;
    store.remove(SETTINGS_KEY)?;
    let defaults = Settings::default().with_default_csv(self.config.default_csv_url.as_deref());
    let old = self.settings.send_replace(defaults.clone());
    drop(store);
    info!(target: "verse_trainer", "Settings reset to defaults");
    if old.csv_url != defaults.csv_url {
      self.load_verses().await;
    }
    Ok(defaults)
  }
}
