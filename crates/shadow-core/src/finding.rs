//! Finding types — one persisted result from an enrichment adapter.
//!
//! Findings are append-only. The owning `target_id` is advisory: it may be
//! absent, or reference a target that does not exist (an orphan finding).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::target::TargetId;

// ─── Email breaches ──────────────────────────────────────────────────────────

/// One breach hit for one target + email pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailBreach {
  pub id:            i64,
  pub target_id:     Option<TargetId>,
  pub email:         String,
  pub breach_name:   Option<String>,
  pub breach_title:  Option<String>,
  pub breach_date:   Option<String>,
  pub breach_domain: Option<String>,
  /// The full provider object, preserved verbatim.
  pub raw:           Value,
  pub found_at:      DateTime<Utc>,
}

/// Input to [`crate::store::ReconStore::append_email_breach`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmailBreach {
  pub target_id:     Option<TargetId>,
  pub email:         String,
  pub breach_name:   Option<String>,
  pub breach_title:  Option<String>,
  pub breach_date:   Option<String>,
  pub breach_domain: Option<String>,
  pub raw:           Value,
}

impl NewEmailBreach {
  /// Normalise one provider breach object. Both `PascalCase` (HIBP v3) and
  /// `camelCase` keys are recognised; the whole object is kept as `raw`.
  pub fn from_provider(
    target_id: Option<TargetId>,
    email: impl Into<String>,
    breach: Value,
  ) -> Self {
    let field = |upper: &str, lower: &str| {
      breach
        .get(upper)
        .or_else(|| breach.get(lower))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
    };

    let breach_name = field("Name", "name");
    let breach_title = field("Title", "title");
    let breach_date = field("BreachDate", "breachDate");
    let breach_domain = field("Domain", "domain");

    Self {
      target_id,
      email: email.into(),
      breach_name,
      breach_title,
      breach_date,
      breach_domain,
      raw: breach,
    }
  }
}

// ─── Source results ──────────────────────────────────────────────────────────

/// A generic finding from any non-breach, non-phone source.
///
/// No bundled adapter writes these yet; the table is an extension point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
  pub id:          i64,
  pub target_id:   Option<TargetId>,
  pub source:      String,
  pub result_type: String,
  pub url:         Option<String>,
  pub score:       f64,
  pub summary:     Option<String>,
  pub raw:         Value,
  pub found_at:    DateTime<Utc>,
}

/// Input to [`crate::store::ReconStore::append_source_result`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewSourceResult {
  pub target_id:   Option<TargetId>,
  pub source:      String,
  pub result_type: String,
  pub url:         Option<String>,
  pub score:       f64,
  pub summary:     Option<String>,
  pub raw:         Value,
}

// ─── Phone lookups ───────────────────────────────────────────────────────────

/// One phone-number normalisation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneLookup {
  pub id:          i64,
  pub target_id:   Option<TargetId>,
  /// The number exactly as supplied.
  pub number:      String,
  /// International (E.164) form; present only when the number validates.
  pub e164:        Option<String>,
  /// ISO 3166-1 alpha-2 region code, e.g. `SN`.
  pub country:     Option<String>,
  pub carrier:     Option<String>,
  pub is_valid:    Option<bool>,
  pub is_possible: Option<bool>,
  pub raw:         Value,
  pub found_at:    DateTime<Utc>,
}

/// Input to [`crate::store::ReconStore::append_phone_lookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoneLookup {
  pub target_id:   Option<TargetId>,
  pub number:      String,
  pub e164:        Option<String>,
  /// ISO 3166-1 alpha-2 region code.
  pub country:     Option<String>,
  pub carrier:     Option<String>,
  pub is_valid:    Option<bool>,
  pub is_possible: Option<bool>,
  pub raw:         Value,
}
