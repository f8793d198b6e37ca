pub mod config;
pub mod error;
pub mod listings;
pub mod pipeline;
pub mod telemetry;

pub use pipeline::{ListingPipeline, PipelineError, PipelineSummary};
