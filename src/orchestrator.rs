use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::PipelineConfig;
use crate::data_model::{is_supported_name, ExtractionRecord, FileType, WorkItem};
use crate::error::{PipelineError, Result};
use crate::executor::BatchExecutor;
use crate::pipeline::progress::ProgressTracker;
use crate::pipeline::writers::{failure_list_path, write_failure_list, MarkdownArchive};
use crate::report::{BatchReport, BatchSummary};
use crate::services::{ObjectStore, Services};
use crate::worker_logic::DocumentProcessor;

/// Where a batch reads its contracts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    ObjectStore { container: String },
    LocalDirectory(PathBuf),
}

/// Files written by a batch run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub report_path: PathBuf,
    pub failure_list_path: Option<PathBuf>,
    pub summary: BatchSummary,
}

pub struct BatchOrchestrator {
    config: PipelineConfig,
    services: Services,
    show_progress: bool,
}

impl BatchOrchestrator {
    pub fn new(config: PipelineConfig, services: Services) -> Self {
        BatchOrchestrator {
            config,
            services,
            show_progress: true,
        }
    }

    /// Disables the progress bar. Status lines are still printed.
    pub fn without_progress_bar(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn store(&self) -> Result<&Arc<dyn ObjectStore>> {
        self.services.store.as_ref().ok_or_else(|| {
            PipelineError::ConfigError(
                "Blob Storage not configured (set STORAGE_ACCOUNT_NAME)".to_string(),
            )
        })
    }

    /// Enumerates the source and turns every supported document into a
    /// work item. A document whose download fails still gets an item.
    pub async fn build_work_items(&self, source: &DocumentSource) -> Result<Vec<WorkItem>> {
        match source {
            DocumentSource::ObjectStore { container } => self.items_from_store(container).await,
            DocumentSource::LocalDirectory(dir) => items_from_directory(dir).await,
        }
    }

    async fn items_from_store(&self, container: &str) -> Result<Vec<WorkItem>> {
        let store = self.store()?;
        let listing = store.list_documents(container).await?;
        let total_listed = listing.len();
        let names: Vec<String> = listing
            .into_iter()
            .map(|info| info.name)
            .filter(|name| is_supported_name(name))
            .collect();
        debug!(total_listed, supported = names.len(), "Listed container");

        if names.is_empty() {
            return Err(PipelineError::NoDocumentsFound {
                location: store.describe(container),
            });
        }

        let mut items = Vec::with_capacity(names.len());
        for name in names {
            let is_pdf = FileType::from_name(&name).ok() == Some(FileType::Pdf);
            if self.config.pdf_by_reference && is_pdf {
                match store.resolve_reference(container, &name) {
                    Ok(reference) => {
                        items.push(WorkItem::from_reference(name, reference));
                        continue;
                    }
                    Err(e) => {
                        warn!(
                            doc_id = %name,
                            error = %e,
                            "No direct reference, downloading instead"
                        );
                    }
                }
            }
            let item = match store.fetch(container, &name).await {
                Ok(bytes) => WorkItem::from_bytes(name, bytes),
                Err(e) => {
                    warn!(doc_id = %name, error = %e, "Download failed");
                    let reason = format!("Could not download file: {}", e);
                    WorkItem::unavailable(name, reason)
                }
            };
            items.push(item);
        }
        Ok(items)
    }

    /// Runs the whole batch and writes the report. Only setup problems
    /// return `Err`; document failures end up in the failure list.
    pub async fn run(&self, source: &DocumentSource, output_csv: &Path) -> Result<RunArtifacts> {
        let items = self.build_work_items(source).await?;
        let total = items.len();
        info!(documents = total, source = ?source, "Found documents to process");

        let progress = Arc::new(if self.show_progress {
            ProgressTracker::new(total, "Extracting")
        } else {
            ProgressTracker::hidden(total)
        });

        let mut processor = DocumentProcessor::from_services(&self.services, &self.config);
        if let DocumentSource::ObjectStore { .. } = source {
            if self.config.save_markdown {
                let store = self.store()?.clone();
                let container = self.config.markdown_container.clone();
                info!(container = %container, "Saving extracted text as markdown");
                processor = processor.with_archive(MarkdownArchive::new(store, container));
            }
        }

        let executor = BatchExecutor::new(Arc::new(processor), self.config.max_workers);
        let outcomes = executor
            .run(items, self.config.parallel, progress.clone())
            .instrument(info_span!("batch", documents = total))
            .await;
        progress.finish("Extraction finished");

        let report = BatchReport::new(outcomes);
        for (id, message) in report.failures() {
            warn!(doc_id = %id, error = %message, "Document failed");
        }

        let schema = self.config.schema.schema();
        let written = report.write_csv(output_csv, &schema)?;
        info!(rows = written, path = %output_csv.display(), "Report written");

        let failed = report.failed_ids();
        let failure_list = if failed.is_empty() {
            None
        } else {
            let path = failure_list_path(output_csv);
            write_failure_list(&path, &failed)?;
            info!(failures = failed.len(), path = %path.display(), "Failure list written");
            Some(path)
        };

        Ok(RunArtifacts {
            report_path: output_csv.to_path_buf(),
            failure_list_path: failure_list,
            summary: report.summary(&self.config),
        })
    }

    /// Extracts one local file with the same read, strategy and retry path
    /// as a batch.
    pub async fn process_single_file(&self, path: &Path) -> Result<ExtractionRecord> {
        if !path.is_file() {
            return Err(PipelineError::ConfigError(format!(
                "File not found: {}",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let item = WorkItem::from_path(name, path);
        let processor = DocumentProcessor::from_services(&self.services, &self.config);
        processor.extract(&item, None).await
    }
}

/// Writes `<stem>_metadata.json` into `out_dir` and returns its path.
pub fn write_sidecar(record: &ExtractionRecord, source: &Path, out_dir: &Path) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| record.document_id.clone());
    let path = out_dir.join(format!("{}_metadata.json", stem));
    std::fs::write(&path, serde_json::to_string_pretty(record)?)?;
    Ok(path)
}

async fn items_from_directory(dir: &Path) -> Result<Vec<WorkItem>> {
    if !dir.is_dir() {
        return Err(PipelineError::ConfigError(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_supported_name(&name) {
            files.push((name, entry.path()));
        }
    }

    if files.is_empty() {
        return Err(PipelineError::NoDocumentsFound {
            location: dir.display().to_string(),
        });
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files
        .into_iter()
        .map(|(name, path)| WorkItem::from_path(name, path))
        .collect())
}
