//! Target — the individual under investigation and the aggregation root for
//! every finding.
//!
//! A target is written once. All attribute values are supplied together at
//! creation; there is no update path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned row identifier of a target.
pub type TargetId = i64;

/// A persisted target row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
  pub target_id:   TargetId,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:  DateTime<Utc>,
  /// Family name, e.g. `Diop`.
  pub family_name: Option<String>,
  /// Given name, e.g. `Mamadou`.
  pub given_name:  Option<String>,
  pub handle:      Option<String>,
  pub email:       Option<String>,
  pub phone:       Option<String>,
  /// Free-text location as typed by the operator.
  pub location:    Option<String>,
  /// Comma-and-space-joined candidate usernames, or `unknown`.
  pub aliases:     Option<String>,
}

/// Input to [`crate::store::ReconStore::create_target`].
/// `target_id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTarget {
  pub family_name: Option<String>,
  pub given_name:  Option<String>,
  pub handle:      Option<String>,
  pub email:       Option<String>,
  pub phone:       Option<String>,
  pub location:    Option<String>,
  pub aliases:     Option<String>,
}

impl NewTarget {
  /// True when neither name part was supplied.
  pub fn is_anonymous(&self) -> bool {
    self.family_name.as_deref().is_none_or(str::is_empty)
      && self.given_name.as_deref().is_none_or(str::is_empty)
  }
}
