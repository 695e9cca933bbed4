#![allow(non_snake_case)]

pub mod config;
pub mod data_model;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod services;
pub mod utils;
pub mod worker_logic;

pub use error::{PipelineError, Result};
pub use orchestrator::{BatchOrchestrator, DocumentSource, RunArtifacts};
