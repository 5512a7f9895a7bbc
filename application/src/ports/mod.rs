//! Ports (interfaces) for external collaborators.
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod audit_trail;
pub mod reasoning;
pub mod tool_registry;

pub use audit_trail::{AuditTrail, InteractionEvent, NoAuditTrail};
pub use reasoning::{ReasoningError, ReasoningService};
pub use tool_registry::{ToolError, ToolHandler, ToolRegistry};
