use crate::config::schema::SchemaVariant;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound for `retry_delay_secs`; one hour.
pub const MAX_RETRY_DELAY_SECS: f64 = 3600.0;

/// Tunables for a batch run, read from YAML. Every field has a default so an
/// empty file (or no file at all) yields a working configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema: SchemaVariant,

    // Execution
    pub max_workers: usize,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub parallel: bool,

    // Strategy selection
    pub use_two_call_for_pdfs: bool,
    pub always_use_two_call: bool,
    /// Hand PDFs in object storage to OCR by reference instead of downloading them.
    pub pdf_by_reference: bool,

    // Character budgets applied before each LLM call
    pub direct_char_budget: usize,
    pub english_char_budget: usize,
    pub translation_char_budget: usize,

    // Output token budgets
    pub direct_max_tokens: u32,
    pub english_max_tokens: u32,
    pub translation_max_tokens: u32,

    pub llm_deployment: Option<String>,

    // Markdown archive of extracted text
    pub save_markdown: bool,
    pub markdown_container: String,

    // Cost estimate shown in the summary
    pub avg_tokens_per_document: u64,
    pub cost_per_million_tokens: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            schema: SchemaVariant::default(),
            max_workers: 10,
            max_retries: 3,
            retry_delay_secs: 2.0,
            parallel: true,
            use_two_call_for_pdfs: true,
            always_use_two_call: false,
            pdf_by_reference: true,
            direct_char_budget: 16_000,
            english_char_budget: 16_000,
            translation_char_budget: 100_000,
            direct_max_tokens: 2000,
            english_max_tokens: 1500,
            translation_max_tokens: 16_000,
            llm_deployment: None,
            save_markdown: true,
            markdown_container: "extracted-markdown".to_string(),
            avg_tokens_per_document: 2000,
            cost_per_million_tokens: 0.15,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(PipelineError::ConfigError(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(PipelineError::ConfigError(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if !(0.0..=MAX_RETRY_DELAY_SECS).contains(&self.retry_delay_secs) {
            return Err(PipelineError::ConfigError(format!(
                "retry_delay_secs must be between 0 and {}, got {}",
                MAX_RETRY_DELAY_SECS, self.retry_delay_secs
            )));
        }
        for (name, budget) in [
            ("direct_char_budget", self.direct_char_budget),
            ("english_char_budget", self.english_char_budget),
            ("translation_char_budget", self.translation_char_budget),
        ] {
            if budget == 0 {
                return Err(PipelineError::ConfigError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        if self.save_markdown && self.markdown_container.trim().is_empty() {
            return Err(PipelineError::ConfigError(
                "markdown_container cannot be empty when save_markdown is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Base backoff delay, clamped to `[0, MAX_RETRY_DELAY_SECS]`.
    pub fn retry_delay(&self) -> Duration {
        let secs = self.retry_delay_secs.clamp(0.0, MAX_RETRY_DELAY_SECS);
        Duration::try_from_secs_f64(secs).unwrap_or_default()
    }

    /// Applies the process environment on top of this config.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged and skipped.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "MAX_WORKERS") {
            self.max_workers = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "RETRY_DELAY") {
            self.retry_delay_secs = v;
        }
        if let Some(v) = bool_var(&lookup, "USE_TWO_CALL_FOR_PDFS") {
            self.use_two_call_for_pdfs = v;
        }
        if let Some(v) = bool_var(&lookup, "ALWAYS_USE_TWO_CALL") {
            self.always_use_two_call = v;
        }
        if let Some(v) = bool_var(&lookup, "SAVE_MARKDOWN") {
            self.save_markdown = v;
        }
        if let Some(v) = lookup("MARKDOWN_CONTAINER").filter(|v| !v.trim().is_empty()) {
            self.markdown_container = v;
        }
        if let Some(v) = lookup("AZURE_OPENAI_DEPLOYMENT").filter(|v| !v.trim().is_empty()) {
            self.llm_deployment = Some(v);
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => {
            debug!(key, value = %raw, "Applied environment override");
            Some(v)
        }
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

// Only the literal "true" (any case) enables a flag.
fn bool_var<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Loads and parses the pipeline configuration YAML file.
pub fn load_pipeline_config<P: AsRef<Path>>(config_path: P) -> Result<PipelineConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read pipeline config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    // serde_yaml turns an empty document into an error; treat it as all defaults.
    if config_content.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }

    serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse pipeline config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })
}
