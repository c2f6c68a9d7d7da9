//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, opaque payloads as compact
//! JSON text, and tri-state flags as nullable 0/1 integers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use shadow_core::{
  TargetId,
  finding::{EmailBreach, PhoneLookup, SourceResult},
  target::Target,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// `Value::Null` is stored as SQL NULL.
pub fn encode_raw(raw: &Value) -> Result<Option<String>> {
  if raw.is_null() {
    Ok(None)
  } else {
    Ok(Some(serde_json::to_string(raw)?))
  }
}

/// Payload text that is not valid JSON is surfaced as a JSON string rather
/// than failing the whole read.
pub fn decode_raw(s: Option<&str>) -> Value {
  match s {
    None => Value::Null,
    Some(text) => {
      serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
    }
  }
}

// ─── Flags ───────────────────────────────────────────────────────────────────

pub fn encode_flag(flag: Option<bool>) -> Option<i64> { flag.map(i64::from) }

pub fn decode_flag(v: Option<i64>) -> Option<bool> { v.map(|n| n != 0) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `targets` row.
pub struct RawTarget {
  pub id:          TargetId,
  pub created_at:  String,
  pub family_name: Option<String>,
  pub given_name:  Option<String>,
  pub handle:      Option<String>,
  pub email:       Option<String>,
  pub phone:       Option<String>,
  pub location:    Option<String>,
  pub aliases:     Option<String>,
}

impl RawTarget {
  pub fn into_target(self) -> Result<Target> {
    Ok(Target {
      target_id:   self.id,
      created_at:  decode_dt(&self.created_at)?,
      family_name: self.family_name,
      given_name:  self.given_name,
      handle:      self.handle,
      email:       self.email,
      phone:       self.phone,
      location:    self.location,
      aliases:     self.aliases,
    })
  }
}

/// Raw values read directly from an `email_breaches` row.
pub struct RawEmailBreach {
  pub id:            i64,
  pub target_id:     Option<TargetId>,
  pub email:         String,
  pub breach_name:   Option<String>,
  pub breach_title:  Option<String>,
  pub breach_date:   Option<String>,
  pub breach_domain: Option<String>,
  pub raw_json:      Option<String>,
  pub found_at:      String,
}

impl RawEmailBreach {
  pub fn into_breach(self) -> Result<EmailBreach> {
    Ok(EmailBreach {
      id:            self.id,
      target_id:     self.target_id,
      email:         self.email,
      breach_name:   self.breach_name,
      breach_title:  self.breach_title,
      breach_date:   self.breach_date,
      breach_domain: self.breach_domain,
      raw:           decode_raw(self.raw_json.as_deref()),
      found_at:      decode_dt(&self.found_at)?,
    })
  }
}

/// Raw values read directly from a `source_results` row.
pub struct RawSourceResult {
  pub id:          i64,
  pub target_id:   Option<TargetId>,
  pub source:      String,
  pub result_type: String,
  pub url:         Option<String>,
  pub score:       f64,
  pub summary:     Option<String>,
  pub raw_json:    Option<String>,
  pub found_at:    String,
}

impl RawSourceResult {
  pub fn into_source_result(self) -> Result<SourceResult> {
    Ok(SourceResult {
      id:          self.id,
      target_id:   self.target_id,
      source:      self.source,
      result_type: self.result_type,
      url:         self.url,
      score:       self.score,
      summary:     self.summary,
      raw:         decode_raw(self.raw_json.as_deref()),
      found_at:    decode_dt(&self.found_at)?,
    })
  }
}

/// Raw values read directly from a `phone_lookups` row.
pub struct RawPhoneLookup {
  pub id:          i64,
  pub target_id:   Option<TargetId>,
  pub number:      String,
  pub e164:        Option<String>,
  pub country:     Option<String>,
  pub carrier:     Option<String>,
  pub is_valid:    Option<i64>,
  pub is_possible: Option<i64>,
  pub raw_json:    Option<String>,
  pub found_at:    String,
}

impl RawPhoneLookup {
  pub fn into_phone_lookup(self) -> Result<PhoneLookup> {
    Ok(PhoneLookup {
      id:          self.id,
      target_id:   self.target_id,
      number:      self.number,
      e164:        self.e164,
      country:     self.country,
      carrier:     self.carrier,
      is_valid:    decode_flag(self.is_valid),
      is_possible: decode_flag(self.is_possible),
      raw:         decode_raw(self.raw_json.as_deref()),
      found_at:    decode_dt(&self.found_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn null_payload_is_sql_null() {
    assert_eq!(encode_raw(&Value::Null).unwrap(), None);
    assert_eq!(decode_raw(None), Value::Null);
  }

  #[test]
  fn non_json_payload_becomes_string() {
    assert_eq!(decode_raw(Some("not json")), json!("not json"));
  }

  #[test]
  fn flags_are_tri_state() {
    assert_eq!(encode_flag(Some(true)), Some(1));
    assert_eq!(encode_flag(Some(false)), Some(0));
    assert_eq!(encode_flag(None), None);
    assert_eq!(decode_flag(Some(1)), Some(true));
    assert_eq!(decode_flag(Some(0)), Some(false));
    assert_eq!(decode_flag(None), None);
  }
}
