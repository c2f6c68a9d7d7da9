//! Core types and trait definitions for the ShadowHunter recon pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store backend, the enrichment adapters and the reporter all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alias;
pub mod error;
pub mod finding;
pub mod report;
pub mod store;
pub mod target;

pub use error::{Error, Result};
pub use target::TargetId;
