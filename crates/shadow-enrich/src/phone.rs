//! Phone metadata lookup.
//!
//! Normalises a raw phone string against the libphonenumber numbering plan
//! (via the `phonenumber` crate) or, when that capability is switched off,
//! against a digits-only fallback.

use std::sync::Arc;

use phonenumber::{Mode, PhoneNumber, country, metadata::DATABASE};
use serde::{Deserialize, Serialize};
use shadow_core::{Error as CoreError, TargetId, finding::NewPhoneLookup, store::ReconStore};
use tracing::{debug, warn};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Phone lookup settings, deserialised from the `[phone]` config table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
  /// ISO 3166 region assumed for numbers without an international prefix.
  pub default_region: String,
  /// `false` forces [`PhoneCapability::DigitsOnly`].
  pub numbering_plan: bool,
}

impl Default for PhoneConfig {
  fn default() -> Self {
    Self {
      default_region: "SN".to_string(),
      numbering_plan: true,
    }
  }
}

/// Which normalisation the adapter is able to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneCapability {
  /// Full parse and validation against the numbering plan.
  NumberingPlan,
  /// Strip to digits and a leading `+`; every typed field stays null.
  DigitsOnly,
}

impl PhoneCapability {
  pub fn resolve(numbering_plan: bool) -> Self {
    if numbering_plan {
      Self::NumberingPlan
    } else {
      Self::DigitsOnly
    }
  }
}

// ─── Normalisation ────────────────────────────────────────────────────────────

/// Why a number could not be normalised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum PhoneIssue {
  EmptyNumber,
  ParseError(String),
}

impl std::fmt::Display for PhoneIssue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::EmptyNumber => write!(f, "empty number"),
      Self::ParseError(msg) => write!(f, "{}", CoreError::Parse(msg.clone())),
    }
  }
}

/// The normalised view of one phone string. Serialised verbatim as the
/// lookup's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneInfo {
  pub raw:         String,
  pub e164:        Option<String>,
  /// ISO 3166-1 alpha-2 region code (`SN`), not a country name.
  pub country:     Option<String>,
  pub carrier:     Option<String>,
  pub is_valid:    Option<bool>,
  /// The national number has a length the region's plan allows.
  pub is_possible: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub issue:       Option<PhoneIssue>,
}

impl PhoneInfo {
  fn blank(raw: &str) -> Self {
    Self {
      raw:         raw.to_string(),
      e164:        None,
      country:     None,
      carrier:     None,
      is_valid:    None,
      is_possible: None,
      issue:       None,
    }
  }

  fn into_new_lookup(self, target_id: Option<TargetId>) -> NewPhoneLookup {
    let raw = serde_json::to_value(&self).unwrap_or_default();
    NewPhoneLookup {
      target_id,
      number: self.raw,
      e164: self.e164,
      country: self.country,
      carrier: self.carrier,
      is_valid: self.is_valid,
      is_possible: self.is_possible,
      raw,
    }
  }
}

/// Normalise `raw` without touching the store.
pub fn quick_phone_info(raw: &str, default_region: &str, capability: PhoneCapability) -> PhoneInfo {
  let mut info = PhoneInfo::blank(raw);
  let trimmed = raw.trim();

  if trimmed.is_empty() {
    info.issue = Some(PhoneIssue::EmptyNumber);
    return info;
  }

  match capability {
    PhoneCapability::DigitsOnly => {
      let digits = digits_only(trimmed);
      info.e164 = (!digits.is_empty()).then_some(digits);
    }
    PhoneCapability::NumberingPlan => {
      let region = default_region.trim().to_ascii_uppercase().parse::<country::Id>().ok();
      match phonenumber::parse(region, trimmed) {
        Ok(number) => {
          let valid = phonenumber::is_valid(&number);
          let e164 = number.format().mode(Mode::E164).to_string();

          info.is_valid = Some(valid);
          info.is_possible = Some(has_possible_length(&number).unwrap_or(valid));
          info.e164 = valid.then_some(e164);
          info.country = number.country().id().map(|id| format!("{id:?}"));
        }
        Err(e) => info.issue = Some(PhoneIssue::ParseError(e.to_string())),
      }
    }
  }

  info
}

/// Whether the national number's length is one the region's numbering plan
/// lists for any number type. `None` when the plan lists no lengths.
fn has_possible_length(number: &PhoneNumber) -> Option<bool> {
  let meta = number.metadata(&DATABASE).or_else(|| {
    DATABASE
      .by_code(&number.code().value())
      .and_then(|m| m.into_iter().next())
  })?;

  let d = meta.descriptors();
  let lengths: Vec<u16> = [
    Some(d.general()),
    d.fixed_line(),
    d.mobile(),
    d.toll_free(),
    d.premium_rate(),
    d.shared_cost(),
    d.personal_number(),
    d.voip(),
    d.pager(),
    d.uan(),
    d.voicemail(),
  ]
  .into_iter()
  .flatten()
  .flat_map(|desc| desc.possible_length().iter().copied())
  .collect();
  if lengths.is_empty() {
    return None;
  }

  let len = u16::try_from(number.national().to_string().len()).ok()?;
  Some(lengths.contains(&len))
}

/// Keep ASCII digits, plus a `+` only in leading position.
fn digits_only(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  if s.starts_with('+') {
    out.push('+');
  }
  out.extend(s.chars().filter(char::is_ascii_digit));
  if out == "+" { String::new() } else { out }
}

// ─── Adapter ──────────────────────────────────────────────────────────────────

/// What a phone lookup did, for the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneSearchSummary {
  pub ok:     bool,
  pub error:  Option<String>,
  pub result: PhoneInfo,
}

/// The phone enrichment adapter.
pub struct PhoneLookupAdapter<S> {
  store:          Arc<S>,
  default_region: String,
  capability:     PhoneCapability,
}

impl<S: ReconStore> PhoneLookupAdapter<S> {
  pub fn new(store: Arc<S>, config: &PhoneConfig) -> Self {
    Self {
      store,
      default_region: config.default_region.clone(),
      capability: PhoneCapability::resolve(config.numbering_plan),
    }
  }

  pub fn capability(&self) -> PhoneCapability { self.capability }

  /// Normalise `number` and, if `save`, append exactly one lookup row
  /// whatever the outcome. Never fails.
  pub async fn search_phone(
    &self,
    number: &str,
    target_id: Option<TargetId>,
    save: bool,
  ) -> PhoneSearchSummary {
    let info = quick_phone_info(number, &self.default_region, self.capability);
    let mut error = info.issue.as_ref().map(ToString::to_string);
    if let Some(issue) = &info.issue {
      warn!(%issue, "phone number not normalised");
    }

    if save {
      let row = info.clone().into_new_lookup(target_id);
      match self.store.append_phone_lookup(row).await {
        Ok(saved) => debug!(id = saved.id, e164 = ?saved.e164, "phone lookup recorded"),
        Err(e) => {
          warn!(error = %e, "failed to save phone lookup");
          error = Some(format!("failed to save phone lookup: {e}"));
        }
      }
    }

    PhoneSearchSummary {
      ok: error.is_none(),
      error,
      result: info,
    }
  }
}

#[cfg(test)]
mod tests {
  use shadow_core::target::NewTarget;
  use shadow_store_sqlite::SqliteStore;

  use super::*;

  async fn adapter(numbering_plan: bool) -> (PhoneLookupAdapter<SqliteStore>, Arc<SqliteStore>, TargetId) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let id = store.create_target(NewTarget::default()).await.unwrap();
    let config = PhoneConfig {
      numbering_plan,
      ..Default::default()
    };
    (PhoneLookupAdapter::new(store.clone(), &config), store, id)
  }

  #[test]
  fn digits_only_strips_formatting() {
    assert_eq!(digits_only("+221 77-123 45 67"), "+221771234567");
    assert_eq!(digits_only("(77) 123.45.67"), "771234567");
    assert_eq!(digits_only("7+7"), "77");
    assert_eq!(digits_only("abc"), "");
    assert_eq!(digits_only("+"), "");
  }

  #[test]
  fn senegal_mobile_validates() {
    let info = quick_phone_info("771234567", "SN", PhoneCapability::NumberingPlan);
    assert_eq!(info.e164.as_deref(), Some("+221771234567"));
    assert_eq!(info.is_valid, Some(true));
    assert_eq!(info.is_possible, Some(true));
    assert_eq!(info.country.as_deref(), Some("SN"));
    assert!(info.carrier.is_none());
    assert!(info.issue.is_none());
  }

  #[test]
  fn wrong_length_for_region_is_not_possible() {
    let info = quick_phone_info("12345678", "SN", PhoneCapability::NumberingPlan);
    assert_eq!(info.is_valid, Some(false));
    assert_eq!(info.is_possible, Some(false));
    assert!(info.e164.is_none());

    let info = quick_phone_info("7712345678", "SN", PhoneCapability::NumberingPlan);
    assert_eq!(info.is_possible, Some(false));
  }

  #[test]
  fn right_length_for_region_is_possible_even_when_invalid() {
    // Nine digits, but no Senegalese range starts with 1.
    let info = quick_phone_info("123456789", "SN", PhoneCapability::NumberingPlan);
    assert_eq!(info.is_valid, Some(false));
    assert_eq!(info.is_possible, Some(true));
  }

  #[test]
  fn international_input_uses_its_own_region() {
    let info = quick_phone_info("+33612345678", "SN", PhoneCapability::NumberingPlan);
    assert_eq!(info.is_valid, Some(true));
    assert_eq!(info.is_possible, Some(true));
    assert_eq!(info.country.as_deref(), Some("FR"));
  }

  #[test]
  fn empty_input_is_a_structured_issue() {
    let info = quick_phone_info("   ", "SN", PhoneCapability::NumberingPlan);
    assert_eq!(info.issue, Some(PhoneIssue::EmptyNumber));
    assert!(info.e164.is_none());

    let payload = serde_json::to_value(&info).unwrap();
    assert_eq!(payload["issue"]["kind"], "empty_number");
  }

  #[test]
  fn fallback_leaves_typed_fields_null() {
    let info = quick_phone_info("abc", "SN", PhoneCapability::DigitsOnly);
    assert!(info.e164.is_none());
    assert!(info.is_valid.is_none());
    assert!(info.is_possible.is_none());
    assert!(info.country.is_none());
  }

  #[tokio::test]
  async fn unparseable_number_still_records_one_row() {
    let (adapter, store, id) = adapter(false).await;
    assert_eq!(adapter.capability(), PhoneCapability::DigitsOnly);

    let summary = adapter.search_phone("abc", Some(id), true).await;
    assert!(summary.result.e164.is_none());
    assert!(summary.result.is_valid.is_none());

    let rows = store.fetch_phone_lookups(id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].number, "abc");
    assert!(rows[0].e164.is_none());
    assert!(rows[0].is_valid.is_none());
    assert!(rows[0].is_possible.is_none());
  }

  #[tokio::test]
  async fn valid_number_is_saved_with_payload() {
    let (adapter, store, id) = adapter(true).await;

    let summary = adapter.search_phone("771234567", Some(id), true).await;
    assert!(summary.ok, "{:?}", summary.error);

    let rows = store.fetch_phone_lookups(id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].e164.as_deref(), Some("+221771234567"));
    assert_eq!(rows[0].raw["raw"], "771234567");
  }

  #[tokio::test]
  async fn empty_number_reports_error_and_records_row() {
    let (adapter, store, id) = adapter(true).await;

    let summary = adapter.search_phone("", Some(id), true).await;
    assert!(!summary.ok);
    assert_eq!(summary.error.as_deref(), Some("empty number"));
    assert_eq!(store.fetch_phone_lookups(id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn parse_failure_reports_parse_error() {
    let (adapter, store, id) = adapter(true).await;

    let summary = adapter.search_phone("abc", Some(id), true).await;
    assert!(!summary.ok);
    assert!(matches!(summary.result.issue, Some(PhoneIssue::ParseError(_))));
    let error = summary.error.unwrap();
    assert!(error.starts_with("parse error: "), "{error}");
    assert_eq!(store.fetch_phone_lookups(id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn save_false_records_nothing() {
    let (adapter, store, id) = adapter(true).await;
    adapter.search_phone("771234567", Some(id), false).await;
    assert!(store.fetch_phone_lookups(id).await.unwrap().is_empty());
  }
}
