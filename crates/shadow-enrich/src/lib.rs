//! Enrichment adapters for the ShadowHunter pipeline.
//!
//! Each adapter wraps exactly one external signal source, normalises its
//! output into a finding shape and appends it through a
//! [`shadow_core::store::ReconStore`]. Adapters never fail the pipeline:
//! every fault is folded into the summary they return.

pub mod breach;
pub mod error;
pub mod phone;

pub use breach::{
  BreachConfig, BreachLookup, BreachTransport, EmailSearchSummary, HibpTransport, LookupOutcome,
  RetryPolicy,
};
pub use error::{Error, Result};
pub use phone::{
  PhoneCapability, PhoneConfig, PhoneInfo, PhoneIssue, PhoneLookupAdapter, PhoneSearchSummary,
  quick_phone_info,
};
