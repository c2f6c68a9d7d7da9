//! Narrative summaries: the LLM prompt, the summarisation backend and the
//! local extractive fallback.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shadow_core::report::{Category, ReportItem};
use tracing::debug;

use crate::{Error, Result, render::heading};

/// System role sent with every completion request.
pub const SYSTEM_ROLE: &str =
  "Tu es un assistant qui résume des rapports OSINT de façon concise, claire et structurée.";

/// Prompts longer than this many characters are truncated.
pub const PROMPT_CAP: usize = 60_000;
/// Characters kept when a prompt is truncated.
pub const PROMPT_KEEP: usize = 59_000;
pub const TRUNCATION_MARKER: &str = "\n\n[TRUNCATED]";

const INSTRUCTIONS: &str = "Voici les éléments d'une enquête OSINT (numérotés). Fais :
1) Un résumé court (3-5 phrases) des informations principales trouvées.
2) Les éléments de preuve clés (liste par numéro d'item).
3) Les points d'attention / risques (liste courte).
4) Recommandations d'étapes suivantes (max 5).

Données :

";

const RECOMMENDATIONS: [&str; 4] = [
  "Vérifier les breaches email listées et récupérer les preuves (liens/download).",
  "Faire une recherche reverse-image si photo disponible.",
  "Vérifier la cohérence localisation/date entre posts trouvés.",
  "Collecter plus de sources indépendantes avant conclusions.",
];

// ─── Prompt ───────────────────────────────────────────────────────────────────

/// Build the user prompt for `items`. Top-level `raw` payloads are replaced
/// by a placeholder, and the result never exceeds [`PROMPT_CAP`] plus the
/// truncation marker (counted in characters).
pub fn build_prompt(items: &[ReportItem]) -> String {
  let parts: Vec<String> = items
    .iter()
    .map(|item| {
      let data = Value::Object(without_raw(&item.data));
      format!("{}\n{data}", heading(item))
    })
    .collect();

  let mut prompt = format!("{INSTRUCTIONS}{}", parts.join("\n\n"));
  if prompt.chars().count() > PROMPT_CAP {
    if let Some((cut, _)) = prompt.char_indices().nth(PROMPT_KEEP) {
      prompt.truncate(cut);
    }
    prompt.push_str(TRUNCATION_MARKER);
  }
  prompt
}

/// Non-object data contributes an empty object.
fn without_raw(data: &Value) -> Map<String, Value> {
  let Some(obj) = data.as_object() else {
    return Map::new();
  };
  obj
    .iter()
    .map(|(k, v)| {
      let v = if k == "raw" { Value::String("[raw omitted]".into()) } else { v.clone() };
      (k.clone(), v)
    })
    .collect()
}

// ─── Local fallback ───────────────────────────────────────────────────────────

/// Deterministic extractive summary: target facts, per-category counts,
/// up to three source extracts and fixed recommendations.
pub fn local_summary(items: &[ReportItem]) -> String {
  let mut lines = vec!["Résumé (local) :".to_string()];

  if let Some(target) = items.iter().find(|i| i.category == Category::Target) {
    let field = |key: &str| target.data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    lines.push(format!(
      "- Cible: {} {} (pseudo: {})",
      field("given_name").unwrap_or_default(),
      field("family_name").unwrap_or_default(),
      field("handle").unwrap_or("N/A"),
    ));
    lines.push(format!(
      "- Email: {}, Téléphone: {}",
      field("email").unwrap_or("N/A"),
      field("phone").unwrap_or("N/A"),
    ));
    lines.push(format!("- Alias proposés: {}", field("aliases").unwrap_or("N/A")));
  }

  let count = |c: Category| items.iter().filter(|i| i.category == c).count();
  lines.push(format!("- Breaches email trouvés: {}", count(Category::EmailBreach)));
  lines.push(format!("- Résultats web / sources: {}", count(Category::SourceResult)));
  lines.push(format!("- Lookups téléphone: {}", count(Category::PhoneLookup)));

  let sources: Vec<_> = items
    .iter()
    .filter(|i| i.category == Category::SourceResult)
    .take(3)
    .collect();
  if !sources.is_empty() {
    lines.push("- Top sources (extraits) :".to_string());
    for s in sources {
      let text = |key: &str| s.data.get(key).and_then(Value::as_str).unwrap_or_default();
      lines.push(format!("  {}. {} - {}", s.index, text("source"), text("summary")));
    }
  }

  lines.push("\nRecommandations :".to_string());
  lines.extend(RECOMMENDATIONS.iter().map(|r| format!("- {r}")));
  lines.join("\n")
}

// ─── Backend ──────────────────────────────────────────────────────────────────

/// A natural-language summarisation backend.
pub trait Summarizer: Send + Sync {
  /// Model identifier, for logs.
  fn model(&self) -> &str;

  /// Complete `prompt` under [`SYSTEM_ROLE`] and return the trimmed text.
  fn summarize(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Summary settings, deserialised from the `[summary]` config table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
  /// `false` always uses the local summary.
  pub enabled:     bool,
  pub base_url:    String,
  pub api_key:     Option<String>,
  pub model:       String,
  pub temperature: f32,
  pub max_tokens:  u32,
}

impl Default for SummaryConfig {
  fn default() -> Self {
    Self {
      enabled:     true,
      base_url:    "https://api.openai.com/v1".to_string(),
      api_key:     None,
      model:       "gpt-4o-mini".to_string(),
      temperature: 0.2,
      max_tokens:  800,
    }
  }
}

/// Any service implementing the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAiSummarizer {
  client:      Client,
  base_url:    String,
  api_key:     String,
  model:       String,
  temperature: f32,
  max_tokens:  u32,
}

impl OpenAiSummarizer {
  /// Returns `Ok(None)` when summarisation is disabled or no API key is
  /// configured.
  pub fn from_config(config: &SummaryConfig) -> Result<Option<Self>> {
    let api_key = config
      .api_key
      .as_deref()
      .map(str::trim)
      .filter(|k| !k.is_empty());
    let (true, Some(api_key)) = (config.enabled, api_key) else {
      return Ok(None);
    };

    let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
    Ok(Some(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      api_key: api_key.to_string(),
      model: config.model.clone(),
      temperature: config.temperature,
      max_tokens: config.max_tokens,
    }))
  }

  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    [ChatMessage<'a>; 2],
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
  content: Option<String>,
}

impl Summarizer for OpenAiSummarizer {
  fn model(&self) -> &str { &self.model }

  async fn summarize(&self, prompt: &str) -> Result<String> {
    let request = ChatRequest {
      model:       &self.model,
      messages:    [
        ChatMessage {
          role:    "system",
          content: SYSTEM_ROLE,
        },
        ChatMessage {
          role:    "user",
          content: prompt,
        },
      ],
      temperature: self.temperature,
      max_tokens:  self.max_tokens,
    };

    debug!(model = %self.model, prompt_chars = prompt.chars().count(), "requesting summary");

    let resp = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Backend(format!("HTTP {status}: {}", body.trim())));
    }

    let body: ChatResponse = resp.json().await?;
    body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .map(|text| text.trim().to_string())
      .filter(|text| !text.is_empty())
      .ok_or_else(|| Error::Backend("empty completion".to_string()))
  }
}
