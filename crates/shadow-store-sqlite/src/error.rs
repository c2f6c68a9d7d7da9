//! Error type for `shadow-store-sqlite`.

use shadow_core::TargetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("target not found: {0}")]
  TargetNotFound(TargetId),
}

impl From<Error> for shadow_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::TargetNotFound(id) => Self::TargetNotFound(id),
      other => Self::Persistence(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
