//! The enrichment pipeline run after the launch gate: email, then phone.

use std::io::{self, Write};

use shadow_core::{
  TargetId,
  alias::{UNKNOWN_ALIAS, generate_aliases},
  store::ReconStore,
  target::NewTarget,
};
use shadow_enrich::{
  BreachLookup, BreachTransport, EmailSearchSummary, PhoneLookupAdapter, PhoneSearchSummary,
};
use tracing::info;

/// Derive the target's candidate usernames before it is saved.
pub fn assign_aliases(target: &mut NewTarget) {
  let aliases = if target.is_anonymous() {
    info!("no name supplied, aliases unknown");
    UNKNOWN_ALIAS.to_owned()
  } else {
    generate_aliases(target.family_name.as_deref(), target.given_name.as_deref())
  };
  target.aliases = Some(aliases);
}

pub struct Pipeline<T, S> {
  pub breach: BreachLookup<T, S>,
  pub phone:  PhoneLookupAdapter<S>,
}

/// What each adapter did. `None` means the input was not supplied.
#[derive(Debug)]
pub struct HuntOutcome {
  pub email: Option<EmailSearchSummary>,
  pub phone: Option<PhoneSearchSummary>,
}

impl<T, S> Pipeline<T, S>
where
  T: BreachTransport,
  S: ReconStore,
{
  /// Run every adapter whose input is present, one at a time, saving
  /// findings against `target_id`.
  pub async fn run(&self, target_id: TargetId, target: &NewTarget) -> HuntOutcome {
    let email = match target.email.as_deref().filter(|e| !e.is_empty()) {
      Some(email) => {
        info!(target_id, email, "starting email lookup");
        Some(self.breach.search_email(email, Some(target_id), true).await)
      }
      None => None,
    };

    let phone = match target.phone.as_deref().filter(|p| !p.is_empty()) {
      Some(number) => {
        info!(target_id, number, "starting phone lookup");
        Some(self.phone.search_phone(number, Some(target_id), true).await)
      }
      None => None,
    };

    HuntOutcome { email, phone }
  }
}

impl HuntOutcome {
  /// Operator-facing account of the run; skipped steps are always named.
  pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
    match &self.email {
      Some(summary) => {
        writeln!(out, "Email lookup for {}:", summary.email)?;
        for note in &summary.notes {
          writeln!(out, "  - {note}")?;
        }
      }
      None => writeln!(out, "No email provided, email lookup skipped.")?,
    }

    match &self.phone {
      Some(summary) if summary.ok => {
        let result = serde_json::to_string(&summary.result).unwrap_or_default();
        writeln!(out, "Phone lookup saved: {result}")?;
      }
      Some(summary) => writeln!(
        out,
        "Phone lookup error: {}",
        summary.error.as_deref().unwrap_or("unknown")
      )?,
      None => writeln!(out, "No phone number provided, phone lookup skipped.")?,
    }

    writeln!(out, "Lookups finished.")
  }
}
