//! Verse list from a published spreadsheet (CSV export).
//!
//! Expected columns, in order: verse text, version, reference. Further columns
//! are ignored. The first non-blank line is a header and is skipped.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use tracing::{info, instrument, warn};

use crate::domain::Verse;
use crate::error::SourceError;
use crate::util::trunc_for_log;

const FETCH_TIMEOUT_SECS: u64 = 20;

/// Fetches spreadsheet exports over HTTP.
#[derive(Clone)]
pub struct CsvSource {
  client: reqwest::Client,
}

impl CsvSource {
  pub fn new() -> Result<Self, SourceError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
      .build()
      .map_err(|e| SourceError::Network(e.to_string()))?;
    Ok(Self { client })
  }

  /// Download and parse the sheet. An empty but readable sheet yields `Ok(vec![])`.
  #[instrument(level = "info", skip(self), fields(url = %trunc_for_log(url, 80)))]
  pub async fn fetch(&self, url: &str) -> Result<Vec<Verse>, SourceError> {
    let url = url.trim();
    if url.is_empty() {
      return Err(SourceError::MissingUrl);
    }
    let parsed = reqwest::Url::parse(url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

    let res = self
      .client
      .get(parsed)
      .header(USER_AGENT, "verse-trainer-backend/0.1")
      .send()
      .await
      .map_err(|e| SourceError::Network(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      warn!(target: "verse_trainer", status, "CSV fetch returned non-success status");
      return Err(SourceError::Http { status });
    }

    let body = res.text().await.map_err(|e| SourceError::Network(e.to_string()))?;
    let verses = parse_csv(&body);
    info!(target: "verse_trainer", bytes = body.len(), verses = verses.len(), "CSV verses loaded");
    Ok(verses)
  }
}

/// Parse a whole CSV payload into verses.
///
/// Rows are lines; a quoted field cannot span lines. Rows with fewer than three
/// fields are dropped. Ids are `verse-{n}`, `n` being the 1-based data row among
/// non-blank lines, so ids stay stable when a short row is skipped.
pub fn parse_csv(text: &str) -> Vec<Verse> {
  let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();
  if lines.len() < 2 {
    return Vec::new();
  }

  lines
    .iter()
    .enumerate()
    .skip(1)
    .filter_map(|(row, line)| {
      let fields = parse_csv_line(line);
      if fields.len() < 3 {
        return None;
      }
      Some(Verse {
        id: format!("verse-{row}"),
        text: fields[0].trim().to_string(),
        version: fields[1].trim().to_string(),
        reference: fields[2].trim().to_string(),
      })
    })
    .collect()
}

/// Split one line on commas outside double quotes. `""` inside quotes is a literal quote.
pub fn parse_csv_line(line: &str) -> Vec<String> {
  let mut fields = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;
  let mut chars = line.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '"' if in_quotes && chars.peek() == Some(&'"') => {
        current.push('"');
        chars.next();
      }
      '"' => in_quotes = !in_quotes,
      ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
      _ => current.push(c),
    }
  }
  fields.push(current);
  fields
}
