//! Breach-directory lookup (email enrichment).
//!
//! Queries HaveIBeenPwned's `breachedaccount` endpoint, normalises every
//! returned breach into an [`NewEmailBreach`] and appends it to the store.

use std::{future::Future, sync::Arc, time::Duration};

use reqwest::{
  Client, StatusCode,
  header::{ACCEPT, HeaderMap, RETRY_AFTER, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shadow_core::{Error as CoreError, TargetId, finding::NewEmailBreach, store::ReconStore};
use tracing::{debug, info, warn};

use crate::Result;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Breach lookup settings, deserialised from the `[breach]` config table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreachConfig {
  pub base_url:            String,
  /// HIBP API key; the lookup is skipped entirely when absent.
  pub api_key:             Option<String>,
  pub user_agent:          String,
  /// Extra attempts after a rate-limited response.
  pub max_retries:         u32,
  /// Wait used when a rate-limited response carries no `Retry-After`.
  pub fallback_retry_secs: u64,
  pub truncate_response:   bool,
}

impl Default for BreachConfig {
  fn default() -> Self {
    Self {
      base_url:            "https://haveibeenpwned.com/api/v3".to_string(),
      api_key:             None,
      user_agent:          "ShadowHunter/1.0".to_string(),
      max_retries:         1,
      fallback_retry_secs: 2,
      truncate_response:   true,
    }
  }
}

/// How rate-limited responses are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub max_retries:   u32,
  pub fallback_wait: Duration,
}

impl From<&BreachConfig> for RetryPolicy {
  fn from(cfg: &BreachConfig) -> Self {
    Self {
      max_retries:   cfg.max_retries,
      fallback_wait: Duration::from_secs(cfg.fallback_retry_secs),
    }
  }
}

// ─── Transport ────────────────────────────────────────────────────────────────

/// The outcome of one request to the breach directory.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
  /// The account appears in these breaches (provider objects, verbatim).
  Found(Vec<Value>),
  /// The account appears in no breach.
  NotFound,
  RateLimited { retry_after: Option<Duration> },
  /// Any other non-success response.
  Error(String),
}

/// One request to the breach directory. Implemented over HTTP by
/// [`HibpTransport`]; tests substitute a recording stub.
pub trait BreachTransport: Send + Sync {
  fn breached_account(
    &self,
    email: &str,
    api_key: &str,
  ) -> impl Future<Output = Result<LookupOutcome>> + Send;
}

/// HTTPS transport for the HIBP v3 API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HibpTransport {
  client:            Client,
  base_url:          String,
  user_agent:        String,
  truncate_response: bool,
}

impl HibpTransport {
  pub fn new(config: &BreachConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      user_agent: config.user_agent.clone(),
      truncate_response: config.truncate_response,
    })
  }

  fn url(&self, email: &str) -> String {
    format!("{}/breachedaccount/{}", self.base_url, urlencoding::encode(email))
  }
}

impl BreachTransport for HibpTransport {
  async fn breached_account(&self, email: &str, api_key: &str) -> Result<LookupOutcome> {
    let resp = self
      .client
      .get(self.url(email))
      .header("hibp-api-key", api_key)
      .header(USER_AGENT, &self.user_agent)
      .header(ACCEPT, "application/json")
      .query(&[("truncateResponse", self.truncate_response.to_string())])
      .send()
      .await?;

    let status = resp.status();
    debug!(%status, "HIBP response");

    if let Some(outcome) = classify(status, resp.headers()) {
      return Ok(outcome);
    }
    if status.is_success() {
      return Ok(LookupOutcome::Found(resp.json().await?));
    }
    let body = resp.text().await.unwrap_or_default();
    Ok(error_outcome(status, &body))
  }
}

/// Map a response onto an outcome from its status and headers alone.
/// `None` means the body is needed: a breach list on success, error text
/// otherwise.
fn classify(status: StatusCode, headers: &HeaderMap) -> Option<LookupOutcome> {
  match status {
    StatusCode::NOT_FOUND => Some(LookupOutcome::NotFound),
    StatusCode::TOO_MANY_REQUESTS => Some(LookupOutcome::RateLimited {
      retry_after: retry_after(headers),
    }),
    _ => None,
  }
}

/// `Retry-After` in delta-seconds. HTTP-date values are ignored and leave
/// the wait to the fallback.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
  headers
    .get(RETRY_AFTER)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| s.trim().parse::<u64>().ok())
    .map(Duration::from_secs)
}

fn error_outcome(status: StatusCode, body: &str) -> LookupOutcome {
  LookupOutcome::Error(format!("HTTP {status}: {}", body.trim()))
}

// ─── Adapter ──────────────────────────────────────────────────────────────────

/// What a breach lookup did, for the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSearchSummary {
  pub email:    String,
  /// `None` when no lookup was made or the lookup failed.
  pub breaches: Option<Vec<Value>>,
  pub notes:    Vec<String>,
}

/// The email enrichment adapter.
pub struct BreachLookup<T, S> {
  transport: T,
  store:     Arc<S>,
  api_key:   Option<String>,
  retry:     RetryPolicy,
}

impl<T, S> BreachLookup<T, S>
where
  T: BreachTransport,
  S: ReconStore,
{
  pub fn new(transport: T, store: Arc<S>, api_key: Option<String>, retry: RetryPolicy) -> Self {
    Self {
      transport,
      store,
      api_key: api_key.filter(|k| !k.trim().is_empty()),
      retry,
    }
  }

  /// Look up `email` and, if `save`, append every breach found under
  /// `target_id`. Never fails; the outcome is described in `notes`.
  pub async fn search_email(
    &self,
    email: &str,
    target_id: Option<TargetId>,
    save: bool,
  ) -> EmailSearchSummary {
    let mut summary = EmailSearchSummary {
      email:    email.to_string(),
      breaches: None,
      notes:    Vec::new(),
    };

    let Some(api_key) = self.api_key.as_deref() else {
      let missing = CoreError::ConfigurationMissing("HIBP_API_KEY".to_string());
      info!(%missing, "skipping breach lookup");
      summary
        .notes
        .push(format!("{missing} (no credential); breach lookup skipped."));
      return summary;
    };

    let breaches = match self.fetch_with_retry(email, api_key).await {
      Ok(b) => b,
      Err(e) => {
        warn!(error = %e, "breach lookup failed");
        summary.notes.push(format!("HIBP lookup failed: {e}"));
        return summary;
      }
    };

    if breaches.is_empty() {
      summary.notes.push("No breach found (HIBP).".to_string());
    } else if save {
      let mut saved = 0usize;
      for breach in &breaches {
        let input = NewEmailBreach::from_provider(target_id, email, breach.clone());
        match self.store.append_email_breach(input).await {
          Ok(_) => saved += 1,
          Err(e) => summary.notes.push(format!("Failed to save breach: {e}")),
        }
      }
      info!(saved, found = breaches.len(), "breaches recorded");
      summary.notes.push(format!("{saved} breach(es) saved."));
    } else {
      summary
        .notes
        .push(format!("{} breach(es) found; not saved.", breaches.len()));
    }

    summary.breaches = Some(breaches);
    summary
  }

  /// Run the request, retrying rate-limited responses at most
  /// `retry.max_retries` times.
  async fn fetch_with_retry(&self, email: &str, api_key: &str) -> shadow_core::Result<Vec<Value>> {
    let mut retries = 0;
    loop {
      let outcome = self
        .transport
        .breached_account(email, api_key)
        .await
        .map_err(|e| CoreError::RemoteService(e.to_string()))?;

      match outcome {
        LookupOutcome::Found(breaches) => return Ok(breaches),
        LookupOutcome::NotFound => return Ok(Vec::new()),
        LookupOutcome::Error(detail) => return Err(CoreError::RemoteService(detail)),
        LookupOutcome::RateLimited { retry_after } => {
          if retries >= self.retry.max_retries {
            return Err(CoreError::RateLimited(retry_after));
          }
          let wait = retry_after.unwrap_or(self.retry.fallback_wait);
          warn!(wait_secs = wait.as_secs(), "HIBP rate limit hit, retrying");
          tokio::time::sleep(wait).await;
          retries += 1;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::VecDeque,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use serde_json::json;
  use shadow_core::target::NewTarget;
  use shadow_store_sqlite::SqliteStore;

  use super::*;

  /// Replays scripted outcomes and counts requests.
  #[derive(Default)]
  struct StubTransport {
    outcomes: Mutex<VecDeque<LookupOutcome>>,
    calls:    AtomicUsize,
  }

  impl StubTransport {
    fn scripted(outcomes: impl IntoIterator<Item = LookupOutcome>) -> Self {
      Self {
        outcomes: Mutex::new(outcomes.into_iter().collect()),
        calls:    AtomicUsize::new(0),
      }
    }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  impl BreachTransport for &StubTransport {
    async fn breached_account(&self, _email: &str, api_key: &str) -> Result<LookupOutcome> {
      assert!(!api_key.is_empty(), "request sent without a credential");
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(
        self
          .outcomes
          .lock()
          .unwrap()
          .pop_front()
          .unwrap_or(LookupOutcome::NotFound),
      )
    }
  }

  const NO_WAIT: RetryPolicy = RetryPolicy {
    max_retries:   1,
    fallback_wait: Duration::ZERO,
  };

  fn rate_limited() -> LookupOutcome {
    LookupOutcome::RateLimited {
      retry_after: Some(Duration::ZERO),
    }
  }

  async fn store_with_target() -> (Arc<SqliteStore>, TargetId) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let id = store.create_target(NewTarget::default()).await.unwrap();
    (Arc::new(store), id)
  }

  fn two_breaches() -> Vec<Value> {
    vec![
      json!({ "Name": "Adobe", "Title": "Adobe", "BreachDate": "2013-10-04", "Domain": "adobe.com" }),
      json!({ "Name": "Canva", "Title": "Canva", "BreachDate": "2019-05-24", "Domain": "canva.com" }),
    ]
  }

  #[tokio::test]
  async fn missing_key_makes_no_request() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::default();
    let lookup = BreachLookup::new(&stub, store.clone(), None, NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), true).await;

    assert_eq!(stub.calls(), 0);
    assert!(summary.breaches.is_none());
    assert_eq!(summary.notes.len(), 1);
    assert!(summary.notes[0].contains("no credential"));
    assert!(summary.notes[0].starts_with("configuration missing: HIBP_API_KEY"));
    assert!(store.fetch_email_breaches(id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn blank_key_counts_as_missing() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::default();
    let lookup = BreachLookup::new(&stub, store, Some("  ".into()), NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), true).await;
    assert_eq!(stub.calls(), 0);
    assert!(summary.notes[0].contains("no credential"));
  }

  #[tokio::test]
  async fn found_breaches_are_saved() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([LookupOutcome::Found(two_breaches())]);
    let lookup = BreachLookup::new(&stub, store.clone(), Some("key".into()), NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), true).await;

    assert_eq!(stub.calls(), 1);
    assert_eq!(summary.breaches.as_ref().map(Vec::len), Some(2));
    assert_eq!(summary.notes, vec!["2 breach(es) saved.".to_string()]);

    let rows = store.fetch_email_breaches(id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].breach_name.as_deref(), Some("Adobe"));
    assert_eq!(rows[1].breach_domain.as_deref(), Some("canva.com"));
    assert_eq!(rows[0].email, "a@example.com");
  }

  #[tokio::test]
  async fn save_false_does_not_persist() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([LookupOutcome::Found(two_breaches())]);
    let lookup = BreachLookup::new(&stub, store.clone(), Some("key".into()), NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), false).await;
    assert_eq!(summary.breaches.as_ref().map(Vec::len), Some(2));
    assert!(summary.notes[0].contains("not saved"));
    assert!(store.fetch_email_breaches(id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn not_found_is_an_empty_success() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([LookupOutcome::NotFound]);
    let lookup = BreachLookup::new(&stub, store, Some("key".into()), NO_WAIT);

    let summary = lookup.search_email("clean@example.com", Some(id), true).await;
    assert_eq!(summary.breaches, Some(Vec::new()));
    assert_eq!(summary.notes, vec!["No breach found (HIBP).".to_string()]);
  }

  #[tokio::test]
  async fn rate_limit_is_retried_once() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([rate_limited(), LookupOutcome::Found(two_breaches())]);
    let lookup = BreachLookup::new(&stub, store.clone(), Some("key".into()), NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), true).await;
    assert_eq!(stub.calls(), 2);
    assert_eq!(summary.breaches.as_ref().map(Vec::len), Some(2));
    assert_eq!(store.fetch_email_breaches(id).await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn repeated_rate_limit_gives_up() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([rate_limited(), rate_limited(), rate_limited()]);
    let lookup = BreachLookup::new(&stub, store, Some("key".into()), NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), true).await;
    assert_eq!(stub.calls(), 2);
    assert!(summary.breaches.is_none());
    assert!(summary.notes[0].contains("rate limited"), "{:?}", summary.notes);
  }

  #[tokio::test]
  async fn retry_count_is_configurable() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([rate_limited(), rate_limited(), rate_limited()]);
    let policy = RetryPolicy { max_retries: 0, ..NO_WAIT };
    let lookup = BreachLookup::new(&stub, store, Some("key".into()), policy);

    lookup.search_email("a@example.com", Some(id), true).await;
    assert_eq!(stub.calls(), 1);
  }

  #[tokio::test]
  async fn remote_error_is_reported_not_raised() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([LookupOutcome::Error("HTTP 401 Unauthorized: bad key".into())]);
    let lookup = BreachLookup::new(&stub, store, Some("key".into()), NO_WAIT);

    let summary = lookup.search_email("a@example.com", Some(id), true).await;
    assert!(summary.breaches.is_none());
    assert!(summary.notes[0].contains("401"));
  }

  #[tokio::test]
  async fn server_retry_after_wins_over_fallback() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([
      LookupOutcome::RateLimited {
        retry_after: Some(Duration::from_millis(50)),
      },
      LookupOutcome::NotFound,
    ]);
    let policy = RetryPolicy {
      max_retries:   1,
      fallback_wait: Duration::from_secs(3600),
    };
    let lookup = BreachLookup::new(&stub, store, Some("key".into()), policy);

    let started = std::time::Instant::now();
    let summary = tokio::time::timeout(
      Duration::from_secs(10),
      lookup.search_email("a@example.com", Some(id), true),
    )
    .await
    .expect("fallback wait used instead of Retry-After");
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(stub.calls(), 2);
    assert_eq!(summary.breaches, Some(Vec::new()));
  }

  #[tokio::test]
  async fn fallback_wait_applies_without_retry_after() {
    let (store, id) = store_with_target().await;
    let stub = StubTransport::scripted([
      LookupOutcome::RateLimited { retry_after: None },
      LookupOutcome::NotFound,
    ]);
    let policy = RetryPolicy {
      max_retries:   1,
      fallback_wait: Duration::from_millis(50),
    };
    let lookup = BreachLookup::new(&stub, store, Some("key".into()), policy);

    let started = std::time::Instant::now();
    lookup.search_email("a@example.com", Some(id), true).await;
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(stub.calls(), 2);
  }

  fn headers(retry_after: Option<&'static str>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(v) = retry_after {
      h.insert(RETRY_AFTER, reqwest::header::HeaderValue::from_static(v));
    }
    h
  }

  #[test]
  fn not_found_status_is_an_empty_result() {
    assert_eq!(
      classify(StatusCode::NOT_FOUND, &headers(None)),
      Some(LookupOutcome::NotFound)
    );
  }

  #[test]
  fn too_many_requests_reads_retry_after_seconds() {
    assert_eq!(
      classify(StatusCode::TOO_MANY_REQUESTS, &headers(Some(" 3 "))),
      Some(LookupOutcome::RateLimited {
        retry_after: Some(Duration::from_secs(3)),
      })
    );
    assert_eq!(
      classify(StatusCode::TOO_MANY_REQUESTS, &headers(None)),
      Some(LookupOutcome::RateLimited { retry_after: None })
    );
  }

  #[test]
  fn unusable_retry_after_is_ignored() {
    let date = headers(Some("Wed, 21 Oct 2015 07:28:00 GMT"));
    assert_eq!(retry_after(&date), None);
    assert_eq!(retry_after(&headers(Some("-1"))), None);
    assert_eq!(
      classify(StatusCode::TOO_MANY_REQUESTS, &date),
      Some(LookupOutcome::RateLimited { retry_after: None })
    );
  }

  #[test]
  fn other_statuses_need_the_body() {
    assert_eq!(classify(StatusCode::OK, &headers(None)), None);
    assert_eq!(classify(StatusCode::UNAUTHORIZED, &headers(Some("3"))), None);
    assert_eq!(classify(StatusCode::SERVICE_UNAVAILABLE, &headers(None)), None);

    let LookupOutcome::Error(text) = error_outcome(StatusCode::UNAUTHORIZED, "  bad key\n") else {
      panic!("expected an error outcome");
    };
    assert_eq!(text, "HTTP 401 Unauthorized: bad key");
  }

  #[test]
  fn email_is_percent_encoded_in_url() {
    let t = HibpTransport::new(&BreachConfig {
      base_url: "https://hibp.test/api/v3/".into(),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(
      t.url("a+b@example.com"),
      "https://hibp.test/api/v3/breachedaccount/a%2Bb%40example.com"
    );
  }
}
