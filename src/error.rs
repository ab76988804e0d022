//! Error types shared by the WCL client, the cache and the HTTP surface.

use thiserror::Error;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, WclError>;

#[derive(Error, Debug)]
pub enum WclError {
  /// No usable access token, or the client-credentials exchange failed
  #[error("Authentication error: {0}")]
  Auth(String),

  /// Network, HTTP or GraphQL error left after the retry
  #[error("Upstream error: {0}")]
  Upstream(String),

  /// Upstream answered, but not in the shape we asked for
  #[error("Failed to decode upstream response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("{0}")]
  NotFound(String),

  /// Malformed caller input
  #[error("{0}")]
  Validation(String),

  #[error("Cache error: {0}")]
  Cache(String),
}

impl From<rusqlite::Error> for WclError {
  fn from(e: rusqlite::Error) -> Self {
    WclError::Cache(e.to_string())
  }
}
