//! Error type for `shadow-report`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Store faults, including an unknown target.
  #[error(transparent)]
  Core(#[from] shadow_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The summarisation backend answered, but not with a usable completion.
  #[error("summarization backend error: {0}")]
  Backend(String),
}

impl Error {
  pub fn is_not_found(&self) -> bool { matches!(self, Self::Core(e) if e.is_not_found()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
