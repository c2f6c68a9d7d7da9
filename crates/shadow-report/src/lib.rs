//! Report assembly for ShadowHunter targets.
//!
//! The [`aggregator`] flattens every persisted row of one target into
//! indexed [`ReportItem`](shadow_core::report::ReportItem)s; [`render`]
//! turns them into durable files, and [`reporter::Reporter`] ties both to a
//! narrative summary produced by a [`summary::Summarizer`] or, failing
//! that, locally.

// Native `async fn` in traits, as in `shadow-core`.
#![allow(async_fn_in_trait)]

pub mod aggregator;
pub mod error;
pub mod render;
pub mod reporter;
pub mod summary;


pub use aggregator::assemble_report_items;
pub use error::{Error, Result};
pub use reporter::{ReportFiles, ReportOutcome, Reporter};
pub use summary::{OpenAiSummarizer, SummaryConfig, Summarizer};
