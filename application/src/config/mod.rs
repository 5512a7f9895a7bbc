//! Application-layer configuration.

mod pipeline_params;

pub use pipeline_params::PipelineParams;
