//! Configuration loading and raw file structures.

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileAuditLogConfig, FileConfig, FileModelsConfig, FilePipelineConfig, FileReasoningConfig,
};
pub use loader::ConfigLoader;
