//! Layered runtime settings: defaults, then the optional TOML file, then
//! `SHADOW_*` environment variables, then the well-known credential
//! variables for anything still unset.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use shadow_enrich::{BreachConfig, PhoneConfig};
use shadow_report::SummaryConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path: PathBuf,
  pub report_dir: PathBuf,
  pub breach:     BreachConfig,
  pub phone:      PhoneConfig,
  pub summary:    SummaryConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("shadowhunter.db"),
      report_dir: PathBuf::from("."),
      breach:     BreachConfig::default(),
      phone:      PhoneConfig::default(),
      summary:    SummaryConfig::default(),
    }
  }
}

impl Settings {
  /// Resolve settings once at startup. A missing file is not an error.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let layered = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SHADOW")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read settings from {}", path.display()))?;

    let mut settings: Settings = layered
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.apply_fallbacks(|name| std::env::var(name).ok());
    Ok(settings)
  }

  /// Fill unset credentials from `HIBP_API_KEY` / `OPENAI_API_KEY`.
  pub fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    let fetch = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

    if !present(&self.breach.api_key) {
      self.breach.api_key = fetch("HIBP_API_KEY");
    }
    if !present(&self.summary.api_key) {
      self.summary.api_key = fetch("OPENAI_API_KEY");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(s.store_path, PathBuf::from("shadowhunter.db"));
    assert_eq!(s.breach.base_url, "https://haveibeenpwned.com/api/v3");
    assert_eq!(s.breach.max_retries, 1);
    assert_eq!(s.phone.default_region, "SN");
    assert!(s.phone.numbering_plan);
    assert_eq!(s.summary.model, "gpt-4o-mini");
    assert_eq!(s.summary.max_tokens, 800);
  }

  #[test]
  fn file_overrides_only_what_it_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shadowhunter.toml");
    std::fs::write(
      &path,
      r#"
store_path = "/tmp/recon.db"

[breach]
api_key = "from-file"
max_retries = 3

[phone]
numbering_plan = false
"#,
    )
    .unwrap();

    let s = Settings::load(&path).unwrap();
    assert_eq!(s.store_path, PathBuf::from("/tmp/recon.db"));
    assert_eq!(s.breach.api_key.as_deref(), Some("from-file"));
    assert_eq!(s.breach.max_retries, 3);
    assert_eq!(s.breach.user_agent, "ShadowHunter/1.0");
    assert!(!s.phone.numbering_plan);
    assert_eq!(s.phone.default_region, "SN");
  }

  #[test]
  fn fallbacks_fill_only_unset_keys() {
    let mut s = Settings::default();
    s.breach.api_key = Some("configured".into());
    s.apply_fallbacks(|name| match name {
      "HIBP_API_KEY" => Some("env-hibp".into()),
      "OPENAI_API_KEY" => Some("env-openai".into()),
      _ => None,
    });

    assert_eq!(s.breach.api_key.as_deref(), Some("configured"));
    assert_eq!(s.summary.api_key.as_deref(), Some("env-openai"));
  }

  #[test]
  fn blank_fallbacks_are_ignored() {
    let mut s = Settings::default();
    s.apply_fallbacks(|_| Some("  ".into()));
    assert!(s.breach.api_key.is_none());
    assert!(s.summary.api_key.is_none());
  }
}
