//! Error types for the verse sources and the scripture API client.

use thiserror::Error;

/// Errors while loading the verse list from a spreadsheet export.
#[derive(Debug, Error)]
pub enum SourceError {
  /// No CSV URL configured.
  #[error("no CSV URL configured")]
  MissingUrl,

  /// The URL could not be parsed.
  #[error("invalid CSV URL: {0}")]
  InvalidUrl(String),

  /// The server answered with a non-success status.
  #[error("CSV fetch failed (HTTP {status})")]
  Http { status: u16 },

  /// Transport-level failure (DNS, connect, timeout, body read).
  #[error("network error: {0}")]
  Network(String),
}

/// Errors from the scripture API.
#[derive(Debug, Error)]
pub enum BibleApiError {
  /// Neither the user nor the server supplied an API key.
  #[error("no API key available")]
  MissingApiKey,

  /// The API returned an error response.
  #[error("API error (HTTP {status}): {message}")]
  Api { status: u16, message: String },

  /// A network error occurred.
  #[error("network error: {0}")]
  Network(String),

  /// The body was not the JSON shape we expect.
  #[error("malformed response: {0}")]
  Malformed(String),
}
