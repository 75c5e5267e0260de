//! Error types shared by the data-access layer and the views.
//!
//! Plumbing (config, terminal, sqlite) uses `color_eyre::Result`. These types
//! cover what a view has to render: failed fetches, rejected writes and
//! invalid form input.

use std::time::Duration;
use thiserror::Error;

/// A fetch that could not produce a payload.
///
/// `Clone` because one in-flight request hands its outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error("network error: {0}")]
  Network(String),

  #[error("server returned {status}: {message}")]
  Http { status: u16, message: String },

  #[error("session expired, please log in again")]
  Unauthorized,

  #[error("unexpected response: {0}")]
  Decode(String),

  #[error("request timed out after {}s", .0.as_secs())]
  Timeout(Duration),

  #[error("no endpoint for query {0}")]
  UnknownQuery(String),
}

impl FetchError {
  /// Short message suitable for a title bar or toast.
  pub fn short(&self) -> String {
    match self {
      FetchError::Http { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      FetchError::Decode(e.to_string())
    } else {
      FetchError::Network(e.to_string())
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(e: serde_json::Error) -> Self {
    FetchError::Decode(e.to_string())
  }
}

/// A write operation the backend rejected. The cache is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{mutation} failed: {source}")]
pub struct MutationError {
  pub mutation: String,
  #[source]
  pub source: FetchError,
}

/// Local form input that failed its constraints. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
  pub field: &'static str,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self {
      field,
      message: message.into(),
    }
  }
}
