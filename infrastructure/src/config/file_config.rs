//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application-layer
//! parameter types where appropriate.

use analyst_application::PipelineParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Orchestration loop settings
    pub pipeline: FilePipelineConfig,
    /// Reasoning engine connection and model selection
    pub reasoning: FileReasoningConfig,
    /// Interaction audit log settings
    pub audit_log: FileAuditLogConfig,
}

/// `[pipeline]` section — bounds for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Overall deadline in seconds for one end-to-end invocation
    pub timeout_secs: u64,
    /// Maximum number of plan steps
    pub max_steps: usize,
    /// Maximum number of repair rounds
    pub max_replans: usize,
    /// Concurrency cap for step execution
    pub max_workers: usize,
    /// Additional attempts per step after the first failure
    pub max_retries: usize,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
    /// Run steps one at a time with no repair rounds
    pub sequential: bool,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let params = PipelineParams::default();
        Self {
            timeout_secs: params.timeout.as_secs(),
            max_steps: params.max_steps,
            max_replans: params.max_replans,
            max_workers: params.max_workers,
            max_retries: params.max_retries,
            retry_delay_ms: params.retry_delay.as_millis() as u64,
            sequential: false,
        }
    }
}

impl FilePipelineConfig {
    /// Convert to the application-layer parameter set.
    pub fn to_params(&self) -> PipelineParams {
        let params = PipelineParams::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_steps(self.max_steps)
            .with_max_replans(self.max_replans)
            .with_max_workers(self.max_workers)
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms));
        if self.sequential {
            params.sequential()
        } else {
            params
        }
    }
}

/// `[reasoning]` section — where and how to reach the reasoning engine.
///
/// The endpoint speaks the OpenAI-compatible `chat/completions` protocol.
/// The API key is read from the environment variable named in `api_key_env`
/// rather than stored in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReasoningConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub models: FileModelsConfig,
}

impl Default for FileReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key_env: "ANALYST_API_KEY".to_string(),
            models: FileModelsConfig::default(),
        }
    }
}

impl FileReasoningConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// `[reasoning.models]` section — role-based model selection.
///
/// Only `default` is required; the other roles fall back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Model for planning, synthesis prose, and the conversational path
    pub default: String,
    /// Lightweight model for intent classification
    pub classifier: Option<String>,
    /// Model to retry against when the primary is rate limited
    pub fallback: Option<String>,
    /// Model for audit verdicts
    pub auditor: Option<String>,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            default: "llama3.1:8b".to_string(),
            classifier: None,
            fallback: None,
            auditor: None,
        }
    }
}

impl FileModelsConfig {
    pub fn classifier(&self) -> &str {
        self.classifier.as_deref().unwrap_or(&self.default)
    }

    pub fn fallback(&self) -> &str {
        self.fallback.as_deref().unwrap_or(&self.default)
    }

    pub fn auditor(&self) -> &str {
        self.auditor.as_deref().unwrap_or(&self.default)
    }
}

/// `[audit_log]` section — JSONL interaction trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditLogConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for FileAuditLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "analyst.audit.jsonl".to_string(),
        }
    }
}
