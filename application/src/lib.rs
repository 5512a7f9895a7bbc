//! Application layer: use cases, ports, and shared tracking state.
//!
//! Orchestrates the domain model through ports to external collaborators
//! (reasoning engine, tool handlers, audit trail). Contains no I/O of its
//! own; adapters live in the infrastructure crate.

pub mod config;
pub mod ports;
pub mod tracking;
pub mod use_cases;

pub use config::PipelineParams;
pub use ports::{
    AuditTrail, InteractionEvent, NoAuditTrail, ReasoningError, ReasoningService, ToolError,
    ToolHandler, ToolRegistry,
};
pub use tracking::{CancelOutcome, ProgressBoard, SessionRegistry};
pub use use_cases::{RunQueryInput, RunQueryOutput, RunQueryUseCase};
