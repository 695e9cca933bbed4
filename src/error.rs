use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported file format: {extension}")]
    UnsupportedFileType { extension: String },

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Translation error: {0}")]
    TranslationError(String),

    // The message keeps the HTTP status text so rate limits stay recognizable.
    #[error("{service} error: {message}")]
    ServiceError {
        service: &'static str,
        message: String,
    },

    #[error("Model returned malformed JSON: {0}")]
    MalformedResponse(String),

    #[error("No contract files found in {location} (looking for: .txt, .docx, .pdf)")]
    NoDocumentsFound { location: String },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("YAML configuration error: {source}")]
    YamlError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("CSV error: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },

    #[error("HTTP transport error: {source}")]
    HttpError { source: reqwest::Error },

    #[error("Extraction attempt panicked: {0}")]
    Panicked(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Content problems (bad file type, unreadable file, failed translation).
    /// These end the document on the first occurrence.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedFileType { .. }
                | PipelineError::ReadError(_)
                | PipelineError::TranslationError(_)
        )
    }

    /// True when the error text carries a rate-limit marker and the error is
    /// not a content error.
    pub fn is_rate_limited(&self) -> bool {
        !self.is_content_error() && looks_rate_limited(&self.to_string())
    }
}

// The request URL is dropped so an endpoint or deployment name can never
// look like a rate-limit marker.
impl From<reqwest::Error> for PipelineError {
    fn from(source: reqwest::Error) -> Self {
        PipelineError::HttpError {
            source: source.without_url(),
        }
    }
}

/// Substring classification used for retry decisions: "rate" (any case) or
/// an HTTP 429 marker.
pub fn looks_rate_limited(message: &str) -> bool {
    message.to_lowercase().contains("rate") || message.contains("429")
}
