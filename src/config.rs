// src/config.rs

pub mod extractor;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod services;

pub use pipeline::{load_pipeline_config, PipelineConfig};
pub use schema::{ExtractionSchema, SchemaVariant, ValidationRule};
pub use services::{AzureAuth, ServiceSettings};
