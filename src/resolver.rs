//! Decide which text a verse is played with: the spreadsheet text, or the same
//! reference fetched from the scripture API in the user's chosen version.
//!
//! Remote failures never reach the game: they are logged and the local text is used.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::domain::{ResolvedVerse, Verse, VerseSourceKind};
use crate::error::BibleApiError;
use crate::reference::{to_verse_id, BookCodes};
use crate::settings::Settings;

/// Remote verse-text lookup keyed by API key, Bible version id and verse id.
#[async_trait]
pub trait ScriptureLookup: Send + Sync {
  /// Whether a usable key exists for this user (their own or a server default).
  fn has_key(&self, user_key: &str) -> bool;

  async fn verse_text(&self, api_key: &str, bible_id: &str, verse_id: &str) -> Result<String, BibleApiError>;
}

#[derive(Clone)]
pub struct VerseResolver {
  lookup: Option<Arc<dyn ScriptureLookup>>,
  codes: BookCodes,
}

impl VerseResolver {
  pub fn new(lookup: Option<Arc<dyn ScriptureLookup>>, codes: BookCodes) -> Self {
    Self { lookup, codes }
  }

  /// Remote text is attempted only when the API version is selected, a Bible id is
  /// chosen and a key is available.
  fn wants_remote<'a>(&'a self, settings: &Settings) -> Option<&'a Arc<dyn ScriptureLookup>> {
    if !settings.use_api_version || settings.selected_bible_id.trim().is_empty() {
      return None;
    }
    self.lookup.as_ref().filter(|l| l.has_key(&settings.bible_api_key))
  }

  /// True when `resolve` may suspend on a network call.
  pub fn is_remote(&self, settings: &Settings) -> bool {
    self.wants_remote(settings).is_some()
  }

  #[instrument(level = "info", skip(self, verse, settings), fields(verse_id = %verse.id, reference = %verse.reference))]
  pub async fn resolve(&self, verse: &Verse, settings: &Settings) -> ResolvedVerse {
    let Some(lookup) = self.wants_remote(settings) else {
      return ResolvedVerse::local(verse);
    };

    let bible_id = settings.selected_bible_id.trim();
    let verse_id = to_verse_id(&verse.reference, &self.codes);
    match lookup.verse_text(&settings.bible_api_key, bible_id, &verse_id).await {
      Ok(content) if !content.trim().is_empty() => {
        debug!(target: "verse_trainer", %verse_id, %bible_id, "Verse text resolved from API");
        ResolvedVerse {
          text: content.trim().to_string(),
          reference: verse.reference.clone(),
          version: bible_id.to_string(),
          source: VerseSourceKind::Api,
        }
      }
      Ok(_) => {
        warn!(target: "verse_trainer", %verse_id, %bible_id, "API returned empty verse text; using local text");
        ResolvedVerse::local(verse)
      }
      Err(e) => {
        warn!(target: "verse_trainer", %verse_id, %bible_id, error = %e, "API verse lookup failed; using local text");
        ResolvedVerse::local(verse)
      }
    }
  }
}
