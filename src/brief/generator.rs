//! Brief generators: the remote LLM call behind a trait, plus the stand-ins
//! used when generation is off and in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::BriefMode;
use crate::config::GeneratorCfg;
use crate::error::DigestError;
use crate::item::Item;

const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

/// What a generator gets for one window.
#[derive(Debug, Clone, Copy)]
pub struct BriefRequest<'a> {
    pub label: &'a str,
    pub mode: BriefMode,
    pub items: &'a [Item],
}

#[async_trait]
pub trait BriefGenerator: Send + Sync {
    /// Markdown summary for the request. Errors become stub briefs.
    async fn generate(&self, req: &BriefRequest<'_>) -> Result<String, DigestError>;
    fn name(&self) -> &str;
}

pub type DynGenerator = Arc<dyn BriefGenerator>;

/// Pick a generator from config. Missing credentials or a disabled/unknown
/// provider give a [`DisabledGenerator`] carrying the reason.
pub fn build_generator(cfg: &GeneratorCfg) -> DynGenerator {
    if !cfg.enabled {
        return Arc::new(DisabledGenerator::new(DigestError::CredentialMissing(
            "Brief generation is disabled in configuration.".into(),
        )));
    }
    if !cfg.provider.eq_ignore_ascii_case("openai") {
        tracing::warn!(target: "brief", provider = %cfg.provider, "unknown generator provider");
        return Arc::new(DisabledGenerator::new(DigestError::CredentialMissing(format!(
            "Generator provider `{}` is not supported.",
            cfg.provider
        ))));
    }
    match OpenAiGenerator::from_config(cfg) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            tracing::warn!(target: "brief", error = %e, "brief generator unavailable");
            Arc::new(DisabledGenerator::new(e))
        }
    }
}

// ------------------------------------------------------------
// OpenAI Responses API
// ------------------------------------------------------------

pub struct OpenAiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct InputMsg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponsesReq<'a> {
    model: &'a str,
    input: Vec<InputMsg<'a>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResponsesResp {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputBlock {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesResp {
    /// `output_text` when present, else the `output_text` parts joined by newlines.
    pub(crate) fn text(&self) -> String {
        if let Some(t) = self.output_text.as_deref() {
            return t.trim().to_string();
        }
        self.output
            .iter()
            .flat_map(|b| b.content.iter())
            .filter(|c| c.kind == "output_text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

impl OpenAiGenerator {
    pub fn from_config(cfg: &GeneratorCfg) -> Result<Self, DigestError> {
        let api_key = cfg.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent("energy-news-digest/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| DigestError::GeneratorFailure(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            endpoint: OPENAI_RESPONSES_URL.to_string(),
        })
    }

    /// Point at a different Responses-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl BriefGenerator for OpenAiGenerator {
    async fn generate(&self, req: &BriefRequest<'_>) -> Result<String, DigestError> {
        let prompt = build_prompt(req.label, req.mode, req.items);
        let body = ResponsesReq {
            model: &self.model,
            input: vec![
                InputMsg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                InputMsg {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let resp = self
            .http
            .post(self.endpoint.as_str())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DigestError::GeneratorFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DigestError::GeneratorFailure(format!("HTTP {status}")));
        }
        let parsed: ResponsesResp = resp
            .json()
            .await
            .map_err(|e| DigestError::GeneratorFailure(format!("malformed response: {e}")))?;
        Ok(parsed.text())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ------------------------------------------------------------
// Stand-ins
// ------------------------------------------------------------

/// Always fails with the reason it was built with.
pub struct DisabledGenerator {
    reason: String,
    credential: bool,
}

impl DisabledGenerator {
    pub fn new(reason: DigestError) -> Self {
        let credential = matches!(reason, DigestError::CredentialMissing(_));
        Self {
            reason: match reason {
                DigestError::CredentialMissing(s) | DigestError::GeneratorFailure(s) => s,
                other => other.to_string(),
            },
            credential,
        }
    }
}

#[async_trait]
impl BriefGenerator for DisabledGenerator {
    async fn generate(&self, _req: &BriefRequest<'_>) -> Result<String, DigestError> {
        Err(if self.credential {
            DigestError::CredentialMissing(self.reason.clone())
        } else {
            DigestError::GeneratorFailure(self.reason.clone())
        })
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Deterministic generator for tests and dry runs. Counts its calls.
pub struct MockGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockGenerator {
    /// Replies with `text`, or with a summary of the request when `text` is empty.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            reply: Err(msg.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BriefGenerator for MockGenerator {
    async fn generate(&self, req: &BriefRequest<'_>) -> Result<String, DigestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(t) if t.is_empty() => {
                let mut md = format!("## {}\n", req.label);
                for it in req.items {
                    md.push_str(&format!("- {} (Source: {})\n", it.title, it.publisher));
                }
                Ok(md)
            }
            Ok(t) => Ok(t.clone()),
            Err(e) => Err(DigestError::GeneratorFailure(e.clone())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
