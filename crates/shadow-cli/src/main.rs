//! `shadowhunter` — interactive OSINT recon pipeline.
//!
//! # Usage
//!
//! ```text
//! shadowhunter                       # interactive hunt
//! shadowhunter hunt --report         # hunt, then write the report
//! shadowhunter report 12 --out ./reports --no-llm
//! shadowhunter aliases --name Diop --surname Mamadou
//! ```

mod console;
mod pipeline;
mod settings;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use console::Console;
use pipeline::Pipeline;
use settings::Settings;
use shadow_core::{TargetId, alias::generate_aliases, store::ReconStore};
use shadow_enrich::{BreachLookup, HibpTransport, PhoneLookupAdapter, RetryPolicy};
use shadow_report::{OpenAiSummarizer, Reporter};
use shadow_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "shadowhunter", version, about = "Target-centric OSINT recon aggregator")]
struct Cli {
  /// Path to the TOML settings file.
  #[arg(short, long, value_name = "FILE", default_value = "shadowhunter.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Describe a target, then run every applicable lookup (the default).
  Hunt {
    /// Write the target's report once the lookups finish.
    #[arg(long)]
    report: bool,
  },

  /// Write the JSON, text and summary report of an existing target.
  Report {
    target_id: TargetId,

    /// Output directory (default: `report_dir` from settings).
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Use the local summary even when a backend is configured.
    #[arg(long)]
    no_llm: bool,

    /// Override the summarisation model.
    #[arg(long, value_name = "NAME")]
    model: Option<String>,
  },

  /// Print candidate usernames for a name.
  Aliases {
    /// Family name.
    #[arg(long)]
    name: Option<String>,

    /// Given name.
    #[arg(long)]
    surname: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr; stdout belongs to the operator console.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match cli.command.unwrap_or(Command::Hunt { report: false }) {
    Command::Hunt { report } => hunt(&settings, report).await,
    Command::Report {
      target_id,
      out,
      no_llm,
      model,
    } => {
      let store = open_store(&settings).await?;
      let out_dir = out.unwrap_or_else(|| settings.report_dir.clone());
      write_report(&settings, &store, target_id, out_dir, !no_llm, model).await
    }
    Command::Aliases { name, surname } => {
      println!("{}", generate_aliases(name.as_deref(), surname.as_deref()));
      Ok(())
    }
  }
}

async fn open_store(settings: &Settings) -> Result<SqliteStore> {
  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {}", settings.store_path.display()))?;
  store.initialize().await.context("failed to initialise store")?;
  Ok(store)
}

// ─── Hunt ─────────────────────────────────────────────────────────────────────

async fn hunt(settings: &Settings, report: bool) -> Result<()> {
  let store = Arc::new(open_store(settings).await?);
  let mut console = Console::new(io::stdin().lock(), io::stdout().lock());

  let mut target = console.collect_target()?;
  pipeline::assign_aliases(&mut target);

  let target_id = store
    .create_target(target.clone())
    .await
    .context("failed to save target")?;
  console.say(format_args!("\nTarget created (id={target_id})."))?;
  if let Some(aliases) = &target.aliases {
    console.say(format_args!("Aliases: {aliases}"))?;
  }

  if !console.wait_for_launch()? {
    return Ok(());
  }
  console.say("Starting lookups ...")?;

  let pipeline = Pipeline {
    breach: BreachLookup::new(
      HibpTransport::new(&settings.breach).context("failed to build HIBP client")?,
      store.clone(),
      settings.breach.api_key.clone(),
      RetryPolicy::from(&settings.breach),
    ),
    phone:  PhoneLookupAdapter::new(store.clone(), &settings.phone),
  };
  let outcome = pipeline.run(target_id, &target).await;

  let mut stdout = console.into_output();
  outcome.write_to(&mut stdout)?;
  drop(stdout);

  if report {
    write_report(settings, &store, target_id, settings.report_dir.clone(), true, None).await?;
  }
  Ok(())
}

// ─── Report ───────────────────────────────────────────────────────────────────

async fn write_report(
  settings: &Settings,
  store: &SqliteStore,
  target_id: TargetId,
  out_dir: PathBuf,
  use_llm: bool,
  model: Option<String>,
) -> Result<()> {
  let summarizer = if use_llm {
    OpenAiSummarizer::from_config(&settings.summary)
      .context("failed to build summarization client")?
      .map(|s| match model {
        Some(m) => s.with_model(m),
        None => s,
      })
  } else {
    None
  };
  if use_llm && summarizer.is_none() {
    info!("no summarization backend configured, using local summary");
  }

  let outcome = Reporter::new(out_dir, summarizer)
    .summarize_target(store, target_id)
    .await
    .with_context(|| format!("failed to report on target {target_id}"))?;

  println!("Files written:");
  println!("  json:    {}", outcome.files.json.display());
  println!("  txt:     {}", outcome.files.txt.display());
  println!("  summary: {}", outcome.files.summary.display());
  println!("\nSummary{}:\n", if outcome.llm_used { " (LLM)" } else { "" });
  println!("{}", outcome.summary);
  Ok(())
}
