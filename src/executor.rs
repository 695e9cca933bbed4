use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::data_model::{ProcessingOutcome, WorkItem};
use crate::pipeline::progress::ProgressTracker;
use crate::utils::prometheus_metrics::{DOCUMENTS_FAILED_TOTAL, DOCUMENTS_SUBMITTED_TOTAL};

#[async_trait]
pub trait ProcessingStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Must always produce an outcome for `item`; errors become `Failure`.
    async fn process(&self, item: WorkItem, progress: &ProgressTracker) -> ProcessingOutcome;
}

/// Runs one `ProcessingStep` over a batch with at most `max_workers`
/// documents in flight.
pub struct BatchExecutor {
    step: Arc<dyn ProcessingStep>,
    max_workers: usize,
}

impl BatchExecutor {
    pub fn new(step: Arc<dyn ProcessingStep>, max_workers: usize) -> Self {
        if max_workers == 0 {
            warn!("max_workers of 0 requested, using 1.");
        }
        BatchExecutor {
            step,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Exactly one outcome per input item. Parallel mode returns them in
    /// completion order.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        parallel: bool,
        progress: Arc<ProgressTracker>,
    ) -> Vec<ProcessingOutcome> {
        DOCUMENTS_SUBMITTED_TOTAL.inc_by(items.len() as f64);
        info!(
            step = self.step.name(),
            documents = items.len(),
            parallel,
            max_workers = self.max_workers,
            "Starting batch"
        );
        if parallel && self.max_workers > 1 {
            self.run_batch_parallel(items, progress).await
        } else {
            self.run_sequential(items, progress).await
        }
    }

    pub async fn run_sequential(
        &self,
        items: Vec<WorkItem>,
        progress: Arc<ProgressTracker>,
    ) -> Vec<ProcessingOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id().to_string();
            let result = AssertUnwindSafe(self.step.process(item, &progress))
                .catch_unwind()
                .await;
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(_) => crashed(&id, "document task panicked", &progress),
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    pub async fn run_batch_parallel(
        &self,
        items: Vec<WorkItem>,
        progress: Arc<ProgressTracker>,
    ) -> Vec<ProcessingOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = FuturesUnordered::new();

        for item in items {
            let id = item.id().to_string();
            let step = self.step.clone();
            let progress = progress.clone();
            let semaphore = semaphore.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| "worker pool closed".to_string())?;
                Ok::<_, String>(step.process(item, &progress).await)
            });
            tasks.push(async move { (id, handle.await) });
        }

        let mut outcomes = Vec::new();
        while let Some((id, joined)) = tasks.next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(reason)) => crashed(&id, &reason, &progress),
                Err(join_error) => {
                    let reason = if join_error.is_panic() {
                        "document task panicked".to_string()
                    } else {
                        format!("document task failed: {}", join_error)
                    };
                    crashed(&id, &reason, &progress)
                }
            };
            debug!(
                doc_id = %outcome.document_id(),
                success = outcome.is_success(),
                "Task finished"
            );
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn crashed(document_id: &str, reason: &str, progress: &ProgressTracker) -> ProcessingOutcome {
    error!(doc_id = %document_id, reason, "Document task did not complete");
    DOCUMENTS_FAILED_TOTAL.inc();
    progress.record(document_id, &format!("FAILED {}", reason));
    ProcessingOutcome::Failure {
        document_id: document_id.to_string(),
        error_message: reason.to_string(),
    }
}
