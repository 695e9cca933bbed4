//! Direct and translate-then-extract strategies plus response normalization.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::config::pipeline::PipelineConfig;
use crate::config::prompts::TRANSLATOR_SYSTEM_PROMPT;
use crate::config::schema::ExtractionSchema;
use crate::data_model::{Confidence, ExtractionMethod, ExtractionRecord, FieldMap, FileType};
use crate::error::{PipelineError, Result};
use crate::pipeline::prompts::{extraction_message, translation_message};
use crate::services::{CompletionRequest, LlmService};
use crate::utils::prometheus_metrics::LLM_REQUEST_DURATION_SECONDS;
use crate::utils::text::{detect_language, non_empty, truncate_chars};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// One extraction call over the original text.
    Direct,
    /// Translate to English first, then extract from the translation.
    TwoCall,
}

impl ExtractionStrategy {
    pub fn select(config: &PipelineConfig, file_type: FileType) -> Self {
        let is_pdf = file_type == FileType::Pdf;
        if config.always_use_two_call || (is_pdf && config.use_two_call_for_pdfs) {
            ExtractionStrategy::TwoCall
        } else {
            ExtractionStrategy::Direct
        }
    }

    pub fn method(&self) -> ExtractionMethod {
        match self {
            ExtractionStrategy::Direct => ExtractionMethod::Direct,
            ExtractionStrategy::TwoCall => ExtractionMethod::TwoCallTranslation,
        }
    }
}

/// Character and token limits for each kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyBudgets {
    pub direct_chars: usize,
    pub english_chars: usize,
    pub translation_chars: usize,
    pub direct_tokens: u32,
    pub english_tokens: u32,
    pub translation_tokens: u32,
}

impl From<&PipelineConfig> for StrategyBudgets {
    fn from(config: &PipelineConfig) -> Self {
        StrategyBudgets {
            direct_chars: config.direct_char_budget,
            english_chars: config.english_char_budget,
            translation_chars: config.translation_char_budget,
            direct_tokens: config.direct_max_tokens,
            english_tokens: config.english_max_tokens,
            translation_tokens: config.translation_max_tokens,
        }
    }
}

pub struct StrategyRunner {
    llm: Arc<dyn LlmService>,
    schema: Arc<ExtractionSchema>,
    budgets: StrategyBudgets,
}

impl StrategyRunner {
    pub fn new(
        llm: Arc<dyn LlmService>,
        schema: Arc<ExtractionSchema>,
        budgets: StrategyBudgets,
    ) -> Self {
        StrategyRunner {
            llm,
            schema,
            budgets,
        }
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    /// Runs one full attempt of `strategy` over `text`.
    pub async fn run(
        &self,
        strategy: ExtractionStrategy,
        text: &str,
        file_name: &str,
    ) -> Result<ExtractionRecord> {
        match strategy {
            ExtractionStrategy::Direct => {
                let body = truncate_chars(text, self.budgets.direct_chars);
                let raw = self
                    .call(
                        "extract",
                        CompletionRequest {
                            system_instruction: self.schema.system_prompt.clone(),
                            user_message: extraction_message(&self.schema, file_name, body, false),
                            json_mode: true,
                            max_output_tokens: self.budgets.direct_tokens,
                        },
                    )
                    .await?;
                self.finish(&raw, text, file_name, ExtractionMethod::Direct)
            }
            ExtractionStrategy::TwoCall => {
                let english = self.translate(text).await?;
                let body = truncate_chars(&english, self.budgets.english_chars);
                let raw = self
                    .call(
                        "extract_english",
                        CompletionRequest {
                            system_instruction: self.schema.system_prompt.clone(),
                            user_message: extraction_message(&self.schema, file_name, body, true),
                            json_mode: true,
                            max_output_tokens: self.budgets.english_tokens,
                        },
                    )
                    .await?;
                self.finish(&raw, text, file_name, ExtractionMethod::TwoCallTranslation)
            }
        }
    }

    /// Translates `text` to English. Any failure, an empty answer included, is
    /// a `TranslationError`.
    pub async fn translate(&self, text: &str) -> Result<String> {
        let body = truncate_chars(text, self.budgets.translation_chars);
        let translation = self
            .call(
                "translate",
                CompletionRequest {
                    system_instruction: TRANSLATOR_SYSTEM_PROMPT.to_string(),
                    user_message: translation_message(body),
                    json_mode: false,
                    max_output_tokens: self.budgets.translation_tokens,
                },
            )
            .await
            .map_err(|e| PipelineError::TranslationError(e.to_string()))?;

        if translation.trim().is_empty() {
            return Err(PipelineError::TranslationError(
                "Model returned an empty translation".to_string(),
            ));
        }
        Ok(translation)
    }

    async fn call(&self, purpose: &str, request: CompletionRequest) -> Result<String> {
        debug!(
            purpose,
            model = self.llm.model(),
            chars = request.user_message.len(),
            "Calling LLM"
        );
        let timer = LLM_REQUEST_DURATION_SECONDS
            .with_label_values(&[purpose])
            .start_timer();
        let result = self.llm.complete(&request).await;
        timer.observe_duration();
        result
    }

    fn finish(
        &self,
        raw: &str,
        source_text: &str,
        file_name: &str,
        method: ExtractionMethod,
    ) -> Result<ExtractionRecord> {
        let object = parse_extraction(raw)?;
        let mut record = normalize(&self.schema, &object, source_text, file_name, method);
        if let Some(field) = &self.schema.file_name_field {
            record.fields.set(field, Some(file_name.to_string()));
        }
        record.extraction_timestamp = Utc::now().to_rfc3339();
        self.schema.apply_rules(&mut record);
        Ok(record)
    }
}

/// Parses a model answer that must be a single JSON object.
pub fn parse_extraction(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| PipelineError::MalformedResponse(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PipelineError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Renders a JSON value as a cell value. Null and blank values become `None`.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_empty(s).map(str::to_string),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(stringify).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Maps a parsed model answer onto the schema. The timestamp is left empty
/// for the caller to stamp.
pub fn normalize(
    schema: &ExtractionSchema,
    object: &Map<String, Value>,
    source_text: &str,
    file_name: &str,
    method: ExtractionMethod,
) -> ExtractionRecord {
    let mut fields = FieldMap::with_fields(schema.fields.iter().cloned());
    for name in &schema.fields {
        fields.set(name, object.get(name).and_then(stringify));
    }

    let source_language = object
        .get("source_language")
        .and_then(stringify)
        .map(|l| l.to_lowercase())
        .filter(|l| l != "unknown")
        .or_else(|| detect_language(source_text))
        .unwrap_or_else(|| "unknown".to_string());

    let confidence = Confidence::parse_lenient(object.get("confidence").and_then(Value::as_str));

    let notes = object
        .get("extraction_notes")
        .or_else(|| object.get("notes"))
        .and_then(stringify);

    ExtractionRecord {
        document_id: file_name.to_string(),
        fields,
        source_language,
        confidence,
        notes,
        extraction_timestamp: String::new(),
        method,
    }
}
