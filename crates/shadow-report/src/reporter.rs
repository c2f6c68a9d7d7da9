//! [`Reporter`] — writes a target's report files and its narrative summary.

use std::path::{Path, PathBuf};

use serde::Serialize;
use shadow_core::{TargetId, report::ReportItem, store::ReconStore};
use tracing::{info, warn};

use crate::{
  Result, assemble_report_items,
  render::{render_json, render_text},
  summary::{OpenAiSummarizer, Summarizer, build_prompt, local_summary},
};

/// Paths of the three artifacts written for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFiles {
  pub json:    PathBuf,
  pub txt:     PathBuf,
  pub summary: PathBuf,
}

impl ReportFiles {
  fn for_target(out_dir: &Path, target_id: TargetId) -> Self {
    let base = format!("target_{target_id}");
    Self {
      json:    out_dir.join(format!("{base}.json")),
      txt:     out_dir.join(format!("{base}.txt")),
      summary: out_dir.join(format!("{base}.summary.txt")),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
  pub files:    ReportFiles,
  pub summary:  String,
  /// True only when the backend produced the summary.
  pub llm_used: bool,
}

/// Renders reports into `out_dir`, summarising with `M` when one is
/// configured and locally otherwise.
pub struct Reporter<M = OpenAiSummarizer> {
  out_dir:    PathBuf,
  summarizer: Option<M>,
}

impl Reporter {
  /// A reporter that never calls a summarisation backend.
  pub fn local(out_dir: impl Into<PathBuf>) -> Self { Self::new(out_dir, None) }
}

impl<M: Summarizer> Reporter<M> {
  pub fn new(out_dir: impl Into<PathBuf>, summarizer: Option<M>) -> Self {
    Self {
      out_dir: out_dir.into(),
      summarizer,
    }
  }

  /// Assemble, render and summarise `target_id`.
  ///
  /// Only store faults (notably an unknown target) and file-system errors
  /// fail; a backend error degrades to the local summary with a note.
  pub async fn summarize_target<S: ReconStore>(
    &self,
    store: &S,
    target_id: TargetId,
  ) -> Result<ReportOutcome> {
    let items = assemble_report_items(store, target_id).await?;
    let files = ReportFiles::for_target(&self.out_dir, target_id);

    tokio::fs::create_dir_all(&self.out_dir).await?;
    tokio::fs::write(&files.json, render_json(&items)?).await?;
    tokio::fs::write(&files.txt, render_text(&items)).await?;

    let (summary, llm_used) = self.narrate(&items).await;
    tokio::fs::write(&files.summary, &summary).await?;

    info!(
      target_id,
      items = items.len(),
      llm_used,
      dir = %self.out_dir.display(),
      "report written"
    );
    Ok(ReportOutcome {
      files,
      summary,
      llm_used,
    })
  }

  async fn narrate(&self, items: &[ReportItem]) -> (String, bool) {
    let Some(summarizer) = &self.summarizer else {
      return (local_summary(items), false);
    };

    match summarizer.summarize(&build_prompt(items)).await {
      Ok(text) => (text, true),
      Err(e) => {
        warn!(model = summarizer.model(), error = %e, "summarization failed, using local summary");
        (format!("{}\n\n(Note: LLM error: {e})", local_summary(items)), false)
      }
    }
  }
}
