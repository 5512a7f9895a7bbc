//! Tool handler adapters.

pub mod reasoning_tool;

pub use reasoning_tool::{ReasoningToolHandler, reasoning_tool_registry};
