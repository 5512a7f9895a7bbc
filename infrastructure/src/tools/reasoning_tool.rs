//! Reasoning-backed tool handlers.
//!
//! Each tool tag maps to a chat completion with a role-specific system
//! prompt: the structured-query tool answers from tabular figures, the
//! knowledge tool from definitions and filings, the advisory tool with
//! recommendations. Swapping one of these for a real database or vector
//! store adapter is a registry change, not a pipeline change.

use crate::reasoning::HttpReasoningGateway;
use analyst_application::ports::tool_registry::{ToolError, ToolHandler, ToolRegistry};
use analyst_domain::{PromptTemplate, ToolTag};
use async_trait::async_trait;
use std::sync::Arc;

/// Tool handler that answers instructions via the reasoning engine.
pub struct ReasoningToolHandler {
    gateway: Arc<HttpReasoningGateway>,
    tag: ToolTag,
}

impl ReasoningToolHandler {
    pub fn new(gateway: Arc<HttpReasoningGateway>, tag: ToolTag) -> Self {
        Self { gateway, tag }
    }
}

#[async_trait]
impl ToolHandler for ReasoningToolHandler {
    async fn execute(&self, instruction: &str) -> Result<String, ToolError> {
        self.gateway
            .completion(PromptTemplate::tool_system(self.tag), instruction)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}

/// Build a registry with a reasoning-backed handler for every tool tag.
pub fn reasoning_tool_registry(gateway: Arc<HttpReasoningGateway>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for &tag in ToolTag::all() {
        registry = registry.register(
            tag,
            Arc::new(ReasoningToolHandler::new(Arc::clone(&gateway), tag)),
        );
    }
    registry
}
