// src/utils/prometheus_metrics.rs

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram,
    register_histogram_vec, Counter, CounterVec, Gauge, Histogram, HistogramVec,
};

// Batch level
pub static DOCUMENTS_SUBMITTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "extractor_documents_submitted_total",
        "Total number of documents handed to the worker pool."
    )
    .expect("Failed to register DOCUMENTS_SUBMITTED_TOTAL counter")
});

pub static DOCUMENTS_SUCCEEDED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "extractor_documents_succeeded_total",
        "Total number of documents with a successful extraction."
    )
    .expect("Failed to register DOCUMENTS_SUCCEEDED_TOTAL counter")
});

pub static DOCUMENTS_FAILED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "extractor_documents_failed_total",
        "Total number of documents that ended in a failure."
    )
    .expect("Failed to register DOCUMENTS_FAILED_TOTAL counter")
});

pub static RETRIES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "extractor_retries_total",
        "Total number of extraction attempts retried after a transient error."
    )
    .expect("Failed to register RETRIES_TOTAL counter")
});

pub static ACTIVE_DOCUMENTS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "extractor_active_documents",
        "Number of documents currently being processed."
    )
    .expect("Failed to register ACTIVE_DOCUMENTS gauge")
});

pub static DOCUMENT_PROCESSING_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "extractor_document_processing_duration_seconds",
        "Histogram of end-to-end document durations, retries and backoff included."
    )
    .expect("Failed to register DOCUMENT_PROCESSING_DURATION_SECONDS histogram")
});

// Service calls
pub static LLM_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "extractor_llm_request_duration_seconds",
        "Histogram of LLM call durations by purpose.",
        &["purpose"]
    )
    .expect("Failed to register LLM_REQUEST_DURATION_SECONDS histogram")
});

pub static OCR_REQUEST_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "extractor_ocr_request_duration_seconds",
        "Histogram of OCR analyze durations, polling included."
    )
    .expect("Failed to register OCR_REQUEST_DURATION_SECONDS histogram")
});

pub static SERVICE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "extractor_service_errors_total",
        "Total number of failed calls to external services.",
        &["service"]
    )
    .expect("Failed to register SERVICE_ERRORS_TOTAL counter")
});

pub static MARKDOWN_UPLOAD_ERRORS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "extractor_markdown_upload_errors_total",
        "Total number of failed markdown archive uploads."
    )
    .expect("Failed to register MARKDOWN_UPLOAD_ERRORS_TOTAL counter")
});
