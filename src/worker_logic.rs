// src/worker_logic.rs

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::pipeline::PipelineConfig;
use crate::data_model::{Confidence, ExtractionRecord, ProcessingOutcome, WorkItem};
use crate::error::{PipelineError, Result};
use crate::executor::ProcessingStep;
use crate::pipeline::progress::ProgressTracker;
use crate::pipeline::readers::{BaseReader, FileReader};
use crate::pipeline::retry::{run_with_retry, RetryNotice, RetryPolicy};
use crate::pipeline::strategy::{ExtractionStrategy, StrategyBudgets, StrategyRunner};
use crate::pipeline::writers::MarkdownArchive;
use crate::services::Services;
use crate::utils::prometheus_metrics::*;

/// Reads, extracts and retries one document at a time. Shared by every
/// worker task.
pub struct DocumentProcessor {
    reader: Arc<dyn BaseReader>,
    runner: StrategyRunner,
    config: PipelineConfig,
    policy: RetryPolicy,
    archive: Option<MarkdownArchive>,
}

impl DocumentProcessor {
    pub fn new(
        reader: Arc<dyn BaseReader>,
        runner: StrategyRunner,
        config: &PipelineConfig,
    ) -> Self {
        DocumentProcessor {
            reader,
            runner,
            config: config.clone(),
            policy: RetryPolicy::from_config(config),
            archive: None,
        }
    }

    /// Wires the file reader and strategy runner to the configured services.
    pub fn from_services(services: &Services, config: &PipelineConfig) -> Self {
        let reader: Arc<dyn BaseReader> = Arc::new(FileReader::new(services.ocr.clone()));
        let runner = StrategyRunner::new(
            services.llm.clone(),
            Arc::new(config.schema.schema()),
            StrategyBudgets::from(config),
        );
        Self::new(reader, runner, config)
    }

    pub fn with_archive(mut self, archive: MarkdownArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Read then extract with retries. Content errors end the document
    /// at once; rate limits and panics back off and try again.
    pub async fn extract(
        &self,
        item: &WorkItem,
        progress: Option<&ProgressTracker>,
    ) -> Result<ExtractionRecord> {
        let file_type = item.file_type()?;
        let strategy = ExtractionStrategy::select(&self.config, file_type);
        let archived = AtomicBool::new(false);
        let archived = &archived;

        run_with_retry(
            &self.policy,
            |attempt| async move {
                debug!(doc_id = %item.id(), attempt, ?strategy, "Extraction attempt");
                let text = self.reader.read(item).await?;
                if let Some(archive) = &self.archive {
                    if !archived.swap(true, Ordering::SeqCst) {
                        archive.archive(item.id(), &text).await;
                    }
                }
                self.runner.run(strategy, &text, item.id()).await
            },
            |notice| {
                if let Some(progress) = progress {
                    progress.note(item.id(), &retry_status(notice));
                }
            },
        )
        .await
    }

    #[instrument(skip_all, fields(doc_id = %item.id()))]
    pub async fn process_item(
        &self,
        item: WorkItem,
        progress: &ProgressTracker,
    ) -> ProcessingOutcome {
        ACTIVE_DOCUMENTS.inc();
        let timer = DOCUMENT_PROCESSING_DURATION_SECONDS.start_timer();

        let outcome = match self.extract(&item, Some(progress)).await {
            Ok(record) => {
                DOCUMENTS_SUCCEEDED_TOTAL.inc();
                self.log_quality(&record);
                progress.record(
                    item.id(),
                    &format!(
                        "OK {}, {}",
                        record.source_language.to_uppercase(),
                        record.confidence
                    ),
                );
                ProcessingOutcome::Success(record)
            }
            Err(e) => {
                DOCUMENTS_FAILED_TOTAL.inc();
                warn!(error = %e, "Document failed");
                progress.record(item.id(), &failure_status(&e));
                ProcessingOutcome::Failure {
                    document_id: item.id().to_string(),
                    error_message: failure_message(&e),
                }
            }
        };

        timer.observe_duration();
        ACTIVE_DOCUMENTS.dec();
        outcome
    }

    fn log_quality(&self, record: &ExtractionRecord) {
        if record.confidence == Confidence::High {
            return;
        }
        let schema = self.runner.schema();
        let missing = schema.missing_fields(record);
        let critical = schema.missing_critical_fields(record);
        if critical.is_empty() {
            info!(
                confidence = %record.confidence,
                missing = ?missing,
                "Extraction needs review"
            );
        } else {
            warn!(
                confidence = %record.confidence,
                missing = ?missing,
                missing_critical = ?critical,
                "Extraction is missing critical fields"
            );
        }
    }
}

#[async_trait]
impl ProcessingStep for DocumentProcessor {
    fn name(&self) -> &'static str {
        "DocumentProcessor"
    }

    async fn process(&self, item: WorkItem, progress: &ProgressTracker) -> ProcessingOutcome {
        self.process_item(item, progress).await
    }
}

/// Failure text stored in the report. Rate-limit exhaustion is called out.
pub fn failure_message(error: &PipelineError) -> String {
    if error.is_rate_limited() {
        format!("{} (Rate limit detected)", error)
    } else {
        error.to_string()
    }
}

fn failure_status(error: &PipelineError) -> String {
    match error {
        PipelineError::ReadError(_) | PipelineError::UnsupportedFileType { .. } => {
            "FAILED read".to_string()
        }
        PipelineError::TranslationError(_) => "FAILED translation".to_string(),
        other => format!("FAILED {}", other),
    }
}

fn retry_status(notice: &RetryNotice<'_>) -> String {
    let reason = match notice.error {
        PipelineError::Panicked(_) => "attempt crashed",
        _ => "rate limited",
    };
    format!(
        "{}, retrying in {}s (attempt {}/{})",
        reason,
        notice.delay.as_secs_f64(),
        notice.attempt,
        notice.max_attempts
    )
}
