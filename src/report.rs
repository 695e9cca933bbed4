use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::config::schema::{
    ExtractionSchema, CONFIDENCE_COLUMN, FILE_NAME_COLUMN, FOLDER_PATH_COLUMN, NOTES_COLUMN,
    SOURCE_LANGUAGE_COLUMN, TIMESTAMP_COLUMN,
};
use crate::config::PipelineConfig;
use crate::data_model::{base_name, folder_of, ExtractionRecord, ProcessingOutcome};
use crate::error::Result;
use crate::pipeline::writers::{BaseWriter, CsvSink, ReportRow};

/// Outcomes of one batch in arrival order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    outcomes: Vec<ProcessingOutcome>,
}

impl BatchReport {
    pub fn new(outcomes: Vec<ProcessingOutcome>) -> Self {
        BatchReport { outcomes }
    }

    pub fn outcomes(&self) -> &[ProcessingOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ExtractionRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            ProcessingOutcome::Success(record) => Some(record),
            ProcessingOutcome::Failure { .. } => None,
        })
    }

    /// `(document_id, error_message)` for every failed document.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            ProcessingOutcome::Failure {
                document_id,
                error_message,
            } => Some((document_id.as_str(), error_message.as_str())),
            ProcessingOutcome::Success(_) => None,
        })
    }

    pub fn failed_ids(&self) -> Vec<String> {
        self.failures().map(|(id, _)| id.to_string()).collect()
    }

    /// One row per success, keyed by the schema's output columns.
    pub fn rows(&self, schema: &ExtractionSchema) -> Vec<ReportRow> {
        self.successes().map(|r| record_row(schema, r)).collect()
    }

    /// Writes the success rows to `path`. The header is written even when
    /// there are no successes.
    pub fn write_csv(&self, path: &Path, schema: &ExtractionSchema) -> Result<usize> {
        let rows = self.rows(schema);
        let mut sink = CsvSink::new(path, schema.output_columns())?;
        sink.write_rows(&rows)?;
        sink.close()?;
        Ok(rows.len())
    }

    pub fn summary(&self, config: &PipelineConfig) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            ..BatchSummary::default()
        };
        for record in self.successes() {
            summary.success += 1;
            *summary
                .languages
                .entry(record.source_language.to_uppercase())
                .or_insert(0) += 1;
            *summary
                .confidence
                .entry(record.confidence.as_str().to_string())
                .or_insert(0) += 1;
        }
        summary.failure = summary.total - summary.success;
        summary.estimated_tokens = summary.success as u64 * config.avg_tokens_per_document;
        summary.estimated_cost =
            summary.estimated_tokens as f64 * config.cost_per_million_tokens / 1_000_000.0;
        summary
    }
}

pub fn record_row(schema: &ExtractionSchema, record: &ExtractionRecord) -> ReportRow {
    let mut row = ReportRow::new();
    if schema.split_folder_path {
        row.insert(FOLDER_PATH_COLUMN.to_string(), folder_of(&record.document_id).to_string());
        row.insert(FILE_NAME_COLUMN.to_string(), base_name(&record.document_id).to_string());
    } else {
        row.insert(FILE_NAME_COLUMN.to_string(), record.document_id.clone());
    }
    row.insert(SOURCE_LANGUAGE_COLUMN.to_string(), record.source_language.clone());
    row.insert(TIMESTAMP_COLUMN.to_string(), record.extraction_timestamp.clone());
    for (name, value) in record.fields.iter() {
        row.insert(name.to_string(), value.unwrap_or_default().to_string());
    }
    row.insert(CONFIDENCE_COLUMN.to_string(), record.confidence.as_str().to_string());
    row.insert(NOTES_COLUMN.to_string(), record.notes.clone().unwrap_or_default());
    row
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub languages: BTreeMap<String, usize>,
    pub confidence: BTreeMap<String, usize>,
    pub estimated_tokens: u64,
    pub estimated_cost: f64,
}

impl BatchSummary {
    pub fn log(&self) {
        info!("--------------------");
        info!("Extraction summary");
        info!("  Documents:  {}", self.total);
        info!("  Succeeded:  {}", self.success);
        info!("  Failed:     {}", self.failure);
        if !self.languages.is_empty() {
            let langs: Vec<String> = self
                .languages
                .iter()
                .map(|(lang, n)| format!("{}: {}", lang, n))
                .collect();
            info!("  Languages:  {}", langs.join(", "));
        }
        if !self.confidence.is_empty() {
            let levels: Vec<String> = self
                .confidence
                .iter()
                .map(|(level, n)| format!("{}: {}", level, n))
                .collect();
            info!("  Confidence: {}", levels.join(", "));
        }
        info!(
            "  Estimated cost: ${:.4} (~{} tokens)",
            self.estimated_cost, self.estimated_tokens
        );
        info!("--------------------");
    }
}
