//! Asks the Generative Language API for the persona's take on an expression.
//! One request, one parse. Anything that goes wrong becomes the persona fallback.

use crate::config::GatewayConfig;
use crate::persona::{fallback_response, system_prompt, Emotion, HistoryEntry, SarcasticResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Source of persona commentary. The gateway only ever talks to this trait.
#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    /// Never fails; errors degrade to [`fallback_response`].
    async fn generate(&self, expression: &str, history: &[HistoryEntry]) -> SarcasticResponse;
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Gemini request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Gemini response parse: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Empty response from model")]
    Empty,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// JSON schema the model must answer with.
fn response_schema() -> serde_json::Value {
    let emotions: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "aiResult": { "type": "STRING" },
            "response": { "type": "STRING" },
            "emotion": { "type": "STRING", "enum": emotions },
            "mood": { "type": "STRING" },
            "activity": { "type": "STRING" }
        },
        "required": ["aiResult", "response", "emotion", "mood", "activity"]
    })
}

/// Models occasionally wrap JSON in a ```json fence even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    match t.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => t,
    }
}

/// Parses the model's text into a [`SarcasticResponse`].
pub fn parse_model_text(raw: &str) -> Result<SarcasticResponse, BridgeError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(BridgeError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

pub struct GeminiBridge {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiBridge {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(60))
    }

    fn with_timeout(api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            model: crate::config::DEFAULT_GEMINI_MODEL.to_string(),
            base_url: crate::config::DEFAULT_GEMINI_BASE_URL.to_string(),
            client,
        }
    }

    pub fn from_config(cfg: &GatewayConfig) -> Self {
        Self::with_timeout(
            cfg.gemini_api_key.clone(),
            Duration::from_secs(cfg.request_timeout_secs),
        )
        .with_model(&cfg.gemini_model)
        .with_base_url(&cfg.gemini_base_url)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// The fallible path: one request, one parse.
    pub async fn try_generate(
        &self,
        expression: &str,
        history: &[HistoryEntry],
    ) -> Result<SarcasticResponse, BridgeError> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_prompt(expression, history)),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(format!("Calculate: {}", expression)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        };

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("x-goog-api-key", key);
        }
        let res = req.send().await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(BridgeError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        let model_text: String = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        parse_model_text(&model_text)
    }
}

#[async_trait]
impl CommentaryProvider for GeminiBridge {
    async fn generate(&self, expression: &str, history: &[HistoryEntry]) -> SarcasticResponse {
        tracing::info!(
            "[SNARKULATOR] Gemini Bridge: asking {} about \"{}\" ({} past calculations).",
            self.model,
            expression,
            history.len()
        );
        match self.try_generate(expression, history).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("[SNARKULATOR] Gemini API error: {}", e);
                fallback_response()
            }
        }
    }
}
