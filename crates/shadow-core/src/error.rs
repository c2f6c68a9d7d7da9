//! Error taxonomy shared by every ShadowHunter crate.

use std::time::Duration;

use thiserror::Error;

use crate::target::TargetId;

#[derive(Debug, Error)]
pub enum Error {
  /// A credential or other required setting is absent.
  #[error("configuration missing: {0}")]
  ConfigurationMissing(String),

  #[error("target not found: {0}")]
  TargetNotFound(TargetId),

  /// Transient; adapters retry a bounded number of times before surfacing it.
  #[error("rate limited (retry after {0:?})")]
  RateLimited(Option<Duration>),

  #[error("remote service error: {0}")]
  RemoteService(String),

  #[error("parse error: {0}")]
  Parse(String),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn is_not_found(&self) -> bool { matches!(self, Self::TargetNotFound(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
