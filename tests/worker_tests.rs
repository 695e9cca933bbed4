// tests/worker_tests.rs

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use common::{extraction_json, rate_limited, MockLlm, BROKEN_DOCX, SWEDISH_TEXT};
use ContractBlaster::config::services::OpenAiSettings;
use ContractBlaster::config::{AzureAuth, ExtractionSchema, PipelineConfig};
use ContractBlaster::data_model::{Confidence, ExtractionMethod, ProcessingOutcome, WorkItem};
use ContractBlaster::error::{PipelineError, Result};
use ContractBlaster::pipeline::progress::ProgressTracker;
use ContractBlaster::pipeline::readers::{BaseReader, FileReader};
use ContractBlaster::pipeline::strategy::{StrategyBudgets, StrategyRunner};
use ContractBlaster::services::{AzureOpenAiClient, CompletionRequest, LlmService};
use ContractBlaster::worker_logic::DocumentProcessor;

fn processor(llm: Arc<MockLlm>, config: &PipelineConfig) -> DocumentProcessor {
    let reader: Arc<dyn BaseReader> = Arc::new(FileReader::new(None));
    let runner = StrategyRunner::new(
        llm,
        Arc::new(ExtractionSchema::clm()),
        StrategyBudgets::from(config),
    );
    DocumentProcessor::new(reader, runner, config)
}

fn text_item(name: &str) -> WorkItem {
    WorkItem::from_bytes(name, SWEDISH_TEXT.as_bytes().to_vec())
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_backoff_doubles() {
    let llm = Arc::new(MockLlm::new(|i, _| {
        if i < 2 {
            Err(rate_limited())
        } else {
            Ok(extraction_json("sv", "high"))
        }
    }));
    let worker = processor(llm.clone(), &PipelineConfig::default());
    let progress = ProgressTracker::hidden(1);

    let outcome = worker.process_item(text_item("avtal.txt"), &progress).await;

    assert!(outcome.is_success());
    let times = llm.call_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_secs(2));
    assert_eq!(times[2] - times[1], Duration::from_secs(4));
    assert_eq!(progress.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_exhaustion_reports_last_error() {
    let llm = Arc::new(MockLlm::new(|_, _| Err(rate_limited())));
    let worker = processor(llm.clone(), &PipelineConfig::default());

    let outcome = worker
        .process_item(text_item("avtal.txt"), &ProgressTracker::hidden(1))
        .await;

    assert_eq!(llm.call_count(), 3);
    match outcome {
        ProcessingOutcome::Failure {
            document_id,
            error_message,
        } => {
            assert_eq!(document_id, "avtal.txt");
            assert!(error_message.contains("429"));
            assert!(error_message.ends_with("(Rate limit detected)"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_service_errors_are_not_retried() {
    let llm = Arc::new(MockLlm::new(|_, _| {
        Err(PipelineError::ServiceError {
            service: "Azure OpenAI",
            message: "request failed (401 Unauthorized): bad key".to_string(),
        })
    }));
    let worker = processor(llm.clone(), &PipelineConfig::default());
    let outcome = worker
        .process_item(text_item("avtal.txt"), &ProgressTracker::hidden(1))
        .await;
    assert!(!outcome.is_success());
    assert_eq!(llm.call_count(), 1);
}

/// Counts calls made through a real client.
struct CountingLlm {
    inner: AzureOpenAiClient,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmService for CountingLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.complete(request).await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[tokio::test]
async fn test_connection_failure_on_rate_named_host_is_not_retried() {
    // Nothing listens on port 1, and both host and deployment contain "rate".
    let client = AzureOpenAiClient::new(OpenAiSettings {
        endpoint: "http://corporate-ai.localhost:1".into(),
        deployment: "corporate-gpt".into(),
        api_version: "2025-01-01-preview".into(),
        auth: AzureAuth::ApiKey("k".into()),
    })
    .unwrap();
    let llm = Arc::new(CountingLlm {
        inner: client,
        calls: AtomicUsize::new(0),
    });
    let config = PipelineConfig::default();
    let runner = StrategyRunner::new(
        llm.clone(),
        Arc::new(ExtractionSchema::clm()),
        StrategyBudgets::from(&config),
    );
    let worker = DocumentProcessor::new(Arc::new(FileReader::new(None)), runner, &config);

    let outcome = worker
        .process_item(text_item("avtal.txt"), &ProgressTracker::hidden(1))
        .await;

    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    match outcome {
        ProcessingOutcome::Failure { error_message, .. } => {
            assert!(!error_message.contains("corporate"), "{}", error_message);
            assert!(!error_message.contains("Rate limit detected"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_read_failure_never_reaches_the_model() {
    let llm = Arc::new(MockLlm::well_behaved());
    let worker = processor(llm.clone(), &PipelineConfig::default());
    let outcome = worker
        .process_item(
            WorkItem::from_bytes("trasig.docx", BROKEN_DOCX.to_vec()),
            &ProgressTracker::hidden(1),
        )
        .await;

    assert_eq!(llm.call_count(), 0);
    match outcome {
        ProcessingOutcome::Failure { error_message, .. } => {
            assert!(error_message.starts_with("Read error"))
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unsupported_extension_fails_immediately() {
    let llm = Arc::new(MockLlm::well_behaved());
    let worker = processor(llm.clone(), &PipelineConfig::default());
    let err = worker
        .extract(&WorkItem::from_bytes("scan.tiff", vec![1, 2, 3]), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported file format: .tiff");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_filename_override_and_normalization() {
    let llm = Arc::new(MockLlm::new(|_, _| Ok(extraction_json("SV", "certain"))));
    let worker = processor(llm, &PipelineConfig::default());
    let record = worker
        .extract(&text_item("se/2023/leveransavtal.txt"), None)
        .await
        .unwrap();

    assert_eq!(
        record.fields.get("Original File Name"),
        Some("se/2023/leveransavtal.txt")
    );
    assert_eq!(record.fields.get("Payment Term"), Some("30"));
    assert_eq!(record.fields.get("Related Master Agreement"), None);
    assert_eq!(record.confidence, Confidence::Medium);
    assert_eq!(record.method, ExtractionMethod::Direct);
    assert!(record.notes.is_none());
    assert!(chrono::DateTime::parse_from_rfc3339(&record.extraction_timestamp).is_ok());
    assert_eq!(record.fields.len(), ExtractionSchema::clm().fields.len());
}

#[tokio::test]
async fn test_always_two_call_translates_first() {
    let llm = Arc::new(MockLlm::well_behaved());
    let config = PipelineConfig {
        always_use_two_call: true,
        ..PipelineConfig::default()
    };
    let worker = processor(llm.clone(), &config);
    let record = worker.extract(&text_item("a.txt"), None).await.unwrap();

    assert_eq!(record.method, ExtractionMethod::TwoCallTranslation);
    let calls = llm.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].json_mode);
    assert!(calls[1].json_mode);
    assert!(calls[1].user_message.contains("[EN]"));
}

#[tokio::test]
async fn test_empty_translation_is_terminal() {
    let llm = Arc::new(MockLlm::new(|_, req| {
        if req.json_mode {
            Ok(extraction_json("sv", "high"))
        } else {
            Ok("   ".to_string())
        }
    }));
    let config = PipelineConfig {
        always_use_two_call: true,
        ..PipelineConfig::default()
    };
    let worker = processor(llm.clone(), &config);
    let err = worker.extract(&text_item("a.txt"), None).await.unwrap_err();
    assert!(matches!(err, PipelineError::TranslationError(_)));
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panic_in_attempt_is_retried() {
    let llm = Arc::new(MockLlm::new(|i, _| {
        if i == 0 {
            panic!("model client crashed");
        }
        Ok(extraction_json("sv", "low"))
    }));
    let worker = processor(llm.clone(), &PipelineConfig::default());
    let record = worker.extract(&text_item("a.txt"), None).await.unwrap();
    assert_eq!(record.confidence, Confidence::Low);
    assert_eq!(llm.call_count(), 2);
}
