//! Tool Registry port
//!
//! Defines the interface for the external data-retrieval capabilities a
//! plan step can invoke, keyed by [`ToolTag`]. Dispatch is a closed enum
//! lookup — unknown tags were already rejected at parse time.

use analyst_domain::ToolTag;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a tool handler.
///
/// The executor treats all handler errors identically: retryable, capped.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("No handler registered for tool {0}")]
    NotRegistered(ToolTag),
}

/// One callable capability: `execute(instruction) -> result text`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, instruction: &str) -> Result<String, ToolError>;
}

/// Registry mapping each tool tag to its handler.
///
/// Built once at wiring time and shared read-only across workers.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<ToolTag, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tag: ToolTag, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(tag, handler);
        self
    }

    pub fn get(&self, tag: ToolTag) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(&tag)
    }

    pub fn has(&self, tag: ToolTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    /// Tags with a registered handler, in canonical order.
    pub fn registered_tags(&self) -> Vec<ToolTag> {
        ToolTag::all()
            .iter()
            .copied()
            .filter(|t| self.has(*t))
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tags", &self.registered_tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn execute(&self, instruction: &str) -> Result<String, ToolError> {
            Ok(format!("echo: {instruction}"))
        }
    }

    #[tokio::test]
    async fn test_register_and_dispatch() {
        let registry =
            ToolRegistry::new().register(ToolTag::StructuredQuery, Arc::new(EchoHandler));

        assert!(registry.has(ToolTag::StructuredQuery));
        assert!(!registry.has(ToolTag::Advisory));
        assert_eq!(registry.registered_tags(), vec![ToolTag::StructuredQuery]);

        let handler = registry.get(ToolTag::StructuredQuery).unwrap();
        let out = handler.execute("total revenue").await.unwrap();
        assert_eq!(out, "echo: total revenue");
    }
}
