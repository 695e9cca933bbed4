// Utils

pub mod common;
pub mod prometheus_metrics;
pub mod text;

pub use common::setup_prometheus_metrics;
pub use text::{detect_language, non_empty, truncate_chars};
