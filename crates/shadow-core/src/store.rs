//! The `ReconStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `shadow-store-sqlite`).
//! Adapters and the aggregator depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  finding::{
    EmailBreach, NewEmailBreach, NewPhoneLookup, NewSourceResult, PhoneLookup,
    SourceResult,
  },
  target::{NewTarget, Target, TargetId},
};

/// Abstraction over a ShadowHunter store backend.
///
/// Every write is an append that is committed before the future resolves;
/// nothing is ever updated or deleted. Finding rows carry an advisory
/// `target_id` that is never checked against the `targets` table.
///
/// Backend errors must convert into the shared taxonomy so that callers can
/// tell a missing target ([`crate::Error::TargetNotFound`]) from a storage
/// fault ([`crate::Error::Persistence`]).
pub trait ReconStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Ensure all record tables exist. Idempotent; safe on every start.
  fn initialize(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Targets ───────────────────────────────────────────────────────────

  /// Insert a target and return its newly assigned identifier.
  fn create_target(
    &self,
    input: NewTarget,
  ) -> impl Future<Output = Result<TargetId, Self::Error>> + Send + '_;

  /// Retrieve a target. Fails with a not-found error if the id is unknown.
  fn fetch_target(
    &self,
    id: TargetId,
  ) -> impl Future<Output = Result<Target, Self::Error>> + Send + '_;

  // ── Findings — append-only writes ─────────────────────────────────────

  fn append_email_breach(
    &self,
    input: NewEmailBreach,
  ) -> impl Future<Output = Result<EmailBreach, Self::Error>> + Send + '_;

  fn append_source_result(
    &self,
    input: NewSourceResult,
  ) -> impl Future<Output = Result<SourceResult, Self::Error>> + Send + '_;

  fn append_phone_lookup(
    &self,
    input: NewPhoneLookup,
  ) -> impl Future<Output = Result<PhoneLookup, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All breaches recorded against `target_id`, in insertion order.
  fn fetch_email_breaches(
    &self,
    target_id: TargetId,
  ) -> impl Future<Output = Result<Vec<EmailBreach>, Self::Error>> + Send + '_;

  /// All source results recorded against `target_id`, in insertion order.
  fn fetch_source_results(
    &self,
    target_id: TargetId,
  ) -> impl Future<Output = Result<Vec<SourceResult>, Self::Error>> + Send + '_;

  /// All phone lookups recorded against `target_id`, in insertion order.
  fn fetch_phone_lookups(
    &self,
    target_id: TargetId,
  ) -> impl Future<Output = Result<Vec<PhoneLookup>, Self::Error>> + Send + '_;
}
