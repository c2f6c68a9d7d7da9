//! Report items — the flattened, indexed unit of rendering and summarisation.
//!
//! Items are never stored; they are recomputed from persisted rows on every
//! reporting invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// The display category of a report item.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
  Target,
  EmailBreach,
  SourceResult,
  PhoneLookup,
}

/// One entry of an assembled report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
  /// 1-based, strictly increasing within one report.
  pub index:    usize,
  pub category: Category,
  pub summary:  String,
  /// The underlying row, serialised with all nested payloads intact.
  pub data:     Value,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_display_matches_serde_tag() {
    for c in [
      Category::Target,
      Category::EmailBreach,
      Category::SourceResult,
      Category::PhoneLookup,
    ] {
      let tag = serde_json::to_value(c).unwrap();
      assert_eq!(tag.as_str(), Some(c.to_string().as_str()));
      assert_eq!(c.as_ref().parse::<Category>().unwrap(), c);
    }
  }

  #[test]
  fn category_tags_are_snake_case() {
    assert_eq!(Category::EmailBreach.to_string(), "email_breach");
    assert_eq!(Category::PhoneLookup.as_ref(), "phone_lookup");
  }
}
