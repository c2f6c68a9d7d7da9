//! Durable renderings of a report: structured JSON and numbered text.

use serde_json::json;
use shadow_core::report::ReportItem;

use crate::Result;

/// `{"items": [...]}`, pretty-printed, nested payloads intact.
pub fn render_json(items: &[ReportItem]) -> Result<String> {
  Ok(serde_json::to_string_pretty(&json!({ "items": items }))?)
}

/// One block per item: the `"{index}. [{category}] {summary}"` heading,
/// the item data as pretty JSON, then a blank line.
pub fn render_text(items: &[ReportItem]) -> String {
  let mut lines = Vec::with_capacity(items.len() * 3);
  for item in items {
    lines.push(heading(item));
    lines.push(
      serde_json::to_string_pretty(&item.data).unwrap_or_else(|_| item.data.to_string()),
    );
    lines.push(String::new());
  }
  lines.join("\n")
}

pub(crate) fn heading(item: &ReportItem) -> String {
  format!("{}. [{}] {}", item.index, item.category, item.summary)
}
