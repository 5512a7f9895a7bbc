//! Logging adapters.

pub mod jsonl_trail;

pub use jsonl_trail::JsonlAuditTrail;
