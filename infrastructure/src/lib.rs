//! Infrastructure layer: adapters for the application-layer ports.
//!
//! Configuration loading, the HTTP reasoning gateway, reasoning-backed tool
//! handlers, and the JSONL audit trail live here. Nothing in this crate is
//! reachable from the domain or application layers except through ports.

pub mod config;
pub mod logging;
pub mod reasoning;
pub mod tools;

pub use config::{ConfigLoader, FileConfig};
pub use logging::JsonlAuditTrail;
pub use reasoning::HttpReasoningGateway;
pub use tools::reasoning_tool_registry;
