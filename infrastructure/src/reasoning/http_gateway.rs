//! OpenAI-compatible HTTP adapter for the reasoning service port.
//!
//! Talks to any endpoint speaking the `chat/completions` protocol (Ollama,
//! vLLM, hosted APIs). Each pipeline role (planner, classifier, auditor) can
//! be pinned to its own model; a rate-limited call is retried once against
//! the configured fallback model before the error propagates.

use crate::config::FileReasoningConfig;
use analyst_application::ports::reasoning::{ReasoningError, ReasoningService};
use analyst_domain::{Intent, PromptTemplate, Verdict};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Models assigned to each pipeline role.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub default: String,
    pub classifier: String,
    pub fallback: String,
    pub auditor: String,
}

impl ModelSelection {
    fn from_config(config: &FileReasoningConfig) -> Self {
        Self {
            default: config.models.default.clone(),
            classifier: config.models.classifier().to_string(),
            fallback: config.models.fallback().to_string(),
            auditor: config.models.auditor().to_string(),
        }
    }
}

/// Reasoning service adapter over an OpenAI-compatible HTTP endpoint.
pub struct HttpReasoningGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    models: ModelSelection,
}

impl HttpReasoningGateway {
    pub fn new(config: &FileReasoningConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key(),
            models: ModelSelection::from_config(config),
        }
    }

    /// One chat completion against the default model, with the rate-limit
    /// fallback applied. Used directly by the reasoning-backed tool handlers.
    pub async fn completion(&self, system: &str, user: &str) -> Result<String, ReasoningError> {
        let model = self.models.default.clone();
        self.complete_with_fallback(&model, system, user).await
    }

    async fn complete_with_fallback(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, ReasoningError> {
        match self.complete(model, system, user).await {
            Err(e) if e.is_recoverable() && self.models.fallback != model => {
                warn!(
                    "Model {model} rate limited; retrying with fallback {}",
                    self.models.fallback
                );
                self.complete(&self.models.fallback, system, user).await
            }
            other => other,
        }
    }

    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, ReasoningError> {
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": user}));
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.2,
        });

        debug!("Chat completion request to model {model} ({} chars)", user.len());

        let mut request = self
            .client
            .post(endpoint_url(&self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReasoningError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ReasoningError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ReasoningError::RequestFailed(format!(
                "{status}: {}",
                detail.trim()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ReasoningError::MalformedResponse(e.to_string()))?;
        extract_content(&payload)
    }
}

#[async_trait]
impl ReasoningService for HttpReasoningGateway {
    async fn plan(&self, prompt: &str) -> Result<String, ReasoningError> {
        let model = self.models.default.clone();
        self.complete_with_fallback(&model, "", prompt).await
    }

    async fn audit(
        &self,
        question: &str,
        context: &str,
        replans_left: usize,
    ) -> Result<Verdict, ReasoningError> {
        let prompt = PromptTemplate::audit(question, context, replans_left);
        let model = self.models.auditor.clone();
        let text = self.complete_with_fallback(&model, "", &prompt).await?;
        Ok(Verdict::parse(&text))
    }

    async fn classify(&self, question: &str) -> Result<Intent, ReasoningError> {
        let prompt = PromptTemplate::classify(question);
        // The classifier model is allowed to be flaky; any failure falls
        // back to the heavier fallback model before the caller's own
        // analytical default kicks in.
        let text = match self.complete(&self.models.classifier, "", &prompt).await {
            Ok(text) => text,
            Err(e) if self.models.fallback != self.models.classifier => {
                warn!(
                    "Classifier model {} failed ({e}); retrying with {}",
                    self.models.classifier, self.models.fallback
                );
                self.complete(&self.models.fallback, "", &prompt).await?
            }
            Err(e) => return Err(e),
        };
        Ok(Intent::parse(&text))
    }

    async fn chat(&self, question: &str) -> Result<String, ReasoningError> {
        let prompt = PromptTemplate::chat(question);
        let model = self.models.default.clone();
        self.complete_with_fallback(&model, "", &prompt).await
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Pull `choices[0].message.content` out of a completion response.
fn extract_content(payload: &Value) -> Result<String, ReasoningError> {
    payload
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            ReasoningError::MalformedResponse(format!(
                "no message content in response: {}",
                truncate(&payload.to_string(), 200)
            ))
        })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
