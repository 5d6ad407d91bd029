//! Domain models: verses, game types, grading results and resolved display text.

use serde::{Deserialize, Serialize};

/// One unit of scripture as loaded from a verse source. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
  pub id: String,
  pub text: String,
  pub reference: String,
  pub version: String,
}

/// Which practice game is active. Exactly one at a time per session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameType {
  #[default]
  FillBlank,
  WordOrder,
  Typing,
}

impl GameType {
  pub fn as_str(self) -> &'static str {
    match self {
      GameType::FillBlank => "fillBlank",
      GameType::WordOrder => "wordOrder",
      GameType::Typing => "typing",
    }
  }
}

/// Where the display text of a resolved verse came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerseSourceKind {
  Csv,  // text as loaded from the spreadsheet
  Api,  // text fetched from the scripture API
}

/// Text chosen for display and play, plus the labels shown next to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedVerse {
  pub text: String,
  pub reference: String,
  pub version: String,
  pub source: VerseSourceKind,
}

impl ResolvedVerse {
  /// Local rendition of a verse: trimmed spreadsheet text and version label.
  pub fn local(verse: &Verse) -> Self {
    Self {
      text: verse.text.trim().to_string(),
      reference: verse.reference.clone(),
      version: verse.version.clone(),
      source: VerseSourceKind::Csv,
    }
  }
}

/// Per-blank feedback after grading a fill-in-the-blank challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankStatus {
  Empty,
  Correct,
  Incorrect,
}

/// Outcome of `check_answer`. Derived; never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
  pub is_correct: bool,
  pub completed: bool,
}
