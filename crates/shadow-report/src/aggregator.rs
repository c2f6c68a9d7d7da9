//! Flattens one target's rows into an ordered, indexed item list.

use serde::Serialize;
use shadow_core::{
  TargetId,
  report::{Category, ReportItem},
  store::ReconStore,
};
use tracing::debug;

/// Collects items and hands out 1-based indices in push order.
#[derive(Default)]
struct ItemList {
  items: Vec<ReportItem>,
}

impl ItemList {
  fn push(
    &mut self,
    category: Category,
    summary: String,
    row: &impl Serialize,
  ) -> shadow_core::Result<()> {
    self.items.push(ReportItem {
      index: self.items.len() + 1,
      category,
      summary,
      data: serde_json::to_value(row)?,
    });
    Ok(())
  }
}

fn into_core(e: impl Into<shadow_core::Error>) -> shadow_core::Error { e.into() }

/// Read every row recorded for `target_id`: the target itself, then email
/// breaches, source results and phone lookups, each in store order.
///
/// Fails with [`shadow_core::Error::TargetNotFound`] when the target does
/// not exist; findings alone never make a report.
pub async fn assemble_report_items<S: ReconStore>(
  store: &S,
  target_id: TargetId,
) -> shadow_core::Result<Vec<ReportItem>> {
  let target = store.fetch_target(target_id).await.map_err(into_core)?;
  let breaches = store
    .fetch_email_breaches(target_id)
    .await
    .map_err(into_core)?;
  let sources = store
    .fetch_source_results(target_id)
    .await
    .map_err(into_core)?;
  let phones = store
    .fetch_phone_lookups(target_id)
    .await
    .map_err(into_core)?;

  let mut list = ItemList::default();
  list.push(
    Category::Target,
    format!("Target basic info (id={})", target.target_id),
    &target,
  )?;
  for b in &breaches {
    let name = b.breach_name.as_deref().unwrap_or("unknown");
    list.push(Category::EmailBreach, format!("Email breach: {name}"), b)?;
  }
  for s in &sources {
    list.push(
      Category::SourceResult,
      format!("Source {} / {}", s.source, s.result_type),
      s,
    )?;
  }
  for p in &phones {
    list.push(Category::PhoneLookup, format!("Phone lookup: {}", p.number), p)?;
  }

  debug!(
    target_id,
    breaches = breaches.len(),
    sources = sources.len(),
    phones = phones.len(),
    "report items assembled"
  );
  Ok(list.items)
}
