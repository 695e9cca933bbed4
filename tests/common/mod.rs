// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;

use ContractBlaster::error::{PipelineError, Result};
use ContractBlaster::services::{
    CompletionRequest, LlmService, ObjectStore, OcrInput, OcrService, Services,
    StoredDocumentInfo,
};

type Responder = Box<dyn Fn(usize, &CompletionRequest) -> Result<String> + Send + Sync>;

/// Scripted chat model. The responder gets the zero-based call index.
pub struct MockLlm {
    responder: Responder,
    latency: Duration,
    calls: Mutex<Vec<(Instant, CompletionRequest)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockLlm {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, &CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        MockLlm {
            responder: Box::new(responder),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Translates by tagging the text and extracts with `extraction_json`.
    pub fn well_behaved() -> Self {
        Self::new(|_, req| {
            if req.json_mode {
                Ok(extraction_json("sv", "high"))
            } else {
                Ok(format!("[EN] {}", req.user_message))
            }
        })
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), request.clone()));
            calls.len() - 1
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(index, request)
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// A CLM-shaped answer with a deliberately wrong file name.
pub fn extraction_json(language: &str, confidence: &str) -> String {
    json!({
        "Original File Name": "model-invented-name.pdf",
        "Counterparty Legal Entity Name": "Fjordline Handel AB",
        "Internal Contracting Entity": "Nordlys Energi AS",
        "Contract Type": "Supply Agreement",
        "Term Type": "Fixed",
        "Effective Date": "01/02/2023",
        "Expiration Date": "01/01/2026",
        "Governing Law": "Sweden",
        "Payment Term": 30,
        "Contract Name": "Leveransavtal",
        "Scope Category level 1": "Goods",
        "Related Master Agreement": null,
        "source_language": language,
        "confidence": confidence,
        "extraction_notes": ""
    })
    .to_string()
}

pub fn rate_limited() -> PipelineError {
    PipelineError::ServiceError {
        service: "Azure OpenAI",
        message: "request failed (429 Too Many Requests): slow down".to_string(),
    }
}

/// Returns fixed lines for every document and remembers what it was given.
pub struct MockOcr {
    lines: Vec<String>,
    pub references: Mutex<Vec<String>>,
    pub byte_inputs: AtomicUsize,
}

impl MockOcr {
    pub fn new(lines: &[&str]) -> Self {
        MockOcr {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            references: Mutex::new(Vec::new()),
            byte_inputs: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OcrService for MockOcr {
    async fn extract_text(&self, input: OcrInput<'_>) -> Result<Vec<String>> {
        match input {
            OcrInput::Bytes(_) => {
                self.byte_inputs.fetch_add(1, Ordering::SeqCst);
            }
            OcrInput::Reference(url) => self.references.lock().unwrap().push(url.to_string()),
        }
        Ok(self.lines.clone())
    }
}

/// In-memory containers. Names in `broken` fail to download.
#[derive(Default)]
pub struct MockStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    broken: HashSet<String>,
    pub containers_created: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, container: &str, name: &str, data: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((container.to_string(), name.to_string()), data.to_vec());
        self
    }

    pub fn with_broken(mut self, container: &str, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self.with_object(container, name, b"")
    }

    pub fn object(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(container.to_string(), name.to_string()))
            .cloned()
    }

    pub fn names(&self, container: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, n)| n.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn list_documents(&self, container: &str) -> Result<Vec<StoredDocumentInfo>> {
        Ok(self
            .names(container)
            .into_iter()
            .map(|name| StoredDocumentInfo { name, size: None })
            .collect())
    }

    async fn fetch(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        if self.broken.contains(name) {
            return Err(PipelineError::ServiceError {
                service: "Blob Storage",
                message: "request failed (500 Internal Server Error)".to_string(),
            });
        }
        self.object(container, name)
            .ok_or_else(|| PipelineError::ServiceError {
                service: "Blob Storage",
                message: format!("request failed (404 Not Found): {}", name),
            })
    }

    fn resolve_reference(&self, container: &str, name: &str) -> Result<String> {
        Ok(format!("https://mock.blob/{}/{}", container, name))
    }

    async fn upload(
        &self,
        container: &str,
        name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert((container.to_string(), name.to_string()), data);
        Ok(())
    }

    async fn ensure_container(&self, _container: &str) -> Result<()> {
        self.containers_created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self, container: &str) -> String {
        format!("mock container '{}'", container)
    }
}

pub fn services(
    llm: Arc<MockLlm>,
    ocr: Option<Arc<MockOcr>>,
    store: Option<Arc<MockStore>>,
) -> Services {
    Services::new(
        llm,
        ocr.map(|o| o as Arc<dyn OcrService>),
        store.map(|s| s as Arc<dyn ObjectStore>),
    )
}

/// Bytes that are not a zip archive, so docx parsing fails.
pub const BROKEN_DOCX: &[u8] = b"this is not a word document";

pub const SWEDISH_TEXT: &str = "Detta leveransavtal ingås mellan Nordlys Energi AS och \
Fjordline Handel AB. Avtalet gäller från och med den första februari och löper i tre år. \
Betalning ska ske inom trettio dagar från fakturadatum. Svensk lag ska tillämpas på avtalet.";
