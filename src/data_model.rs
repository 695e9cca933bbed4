use crate::error::{PipelineError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Extensions the reader knows how to handle, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "docx", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    PlainText,
    WordDocument,
    Pdf,
}

impl FileType {
    /// Parses an extension such as `pdf`, `.PDF` or `Docx`.
    pub fn from_extension(extension: &str) -> Result<Self> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "txt" => Ok(FileType::PlainText),
            "docx" => Ok(FileType::WordDocument),
            "pdf" => Ok(FileType::Pdf),
            "" => Err(PipelineError::UnsupportedFileType {
                extension: "(none)".to_string(),
            }),
            _ => Err(PipelineError::UnsupportedFileType {
                extension: format!(".{}", normalized),
            }),
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::from_extension(extension_of(name))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileType::PlainText => "txt",
            FileType::WordDocument => "docx",
            FileType::Pdf => "pdf",
        }
    }
}

/// Returns the text after the last `.` of the final path component, or "".
pub fn extension_of(name: &str) -> &str {
    let base = base_name(name);
    match base.rfind('.') {
        Some(idx) if idx + 1 < base.len() => &base[idx + 1..],
        _ => "",
    }
}

/// Final component of a `/` or `\` separated name.
pub fn base_name(name: &str) -> &str {
    name.rsplit(is_separator).next().unwrap_or(name)
}

/// Everything before the final component, or "" for a bare name.
pub fn folder_of(name: &str) -> &str {
    match name.rfind(is_separator) {
        Some(idx) => &name[..idx],
        None => "",
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

pub fn is_supported_name(name: &str) -> bool {
    FileType::from_name(name).is_ok()
}

/// Where the raw bytes of a document come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Bytes(Vec<u8>),
    LocalPath(PathBuf),
    /// Direct storage reference the OCR service can fetch by itself.
    Reference(String),
    /// Fetching failed while enumerating; carries the reason.
    Unavailable(String),
}

/// One document queued for processing. Immutable once built.
#[derive(Debug, Clone)]
pub struct WorkItem {
    id: String,
    content: ContentSource,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, content: ContentSource) -> Self {
        WorkItem {
            id: id.into(),
            content,
        }
    }

    pub fn from_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(id, ContentSource::Bytes(bytes))
    }

    pub fn from_path(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(id, ContentSource::LocalPath(path.into()))
    }

    pub fn from_reference(id: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(id, ContentSource::Reference(reference.into()))
    }

    pub fn unavailable(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(id, ContentSource::Unavailable(reason.into()))
    }

    /// Document identity: the storage name (possibly with folders) or local file name.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &ContentSource {
        &self.content
    }

    pub fn extension(&self) -> &str {
        extension_of(&self.id)
    }

    pub fn file_type(&self) -> Result<FileType> {
        FileType::from_name(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Anything unrecognised falls back to `Medium`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Confidence::High,
            Some("low") => Confidence::Low,
            _ => Confidence::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    Direct,
    TwoCallTranslation,
}

/// Schema fields in their configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, Option<String>)>,
}

impl FieldMap {
    /// Builds a map holding every name with no value.
    pub fn with_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldMap {
            entries: names.into_iter().map(|n| (n.into(), None)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Sets a value, appending the field if it is not present yet.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A successful extraction for one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    pub document_id: String,
    #[serde(flatten)]
    pub fields: FieldMap,
    pub source_language: String,
    pub confidence: Confidence,
    pub notes: Option<String>,
    pub extraction_timestamp: String,
    pub method: ExtractionMethod,
}

impl ExtractionRecord {
    /// Appends a sentence to `notes`, creating it if empty.
    pub fn append_note(&mut self, note: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing, note),
            _ => note.to_string(),
        });
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum ProcessingOutcome {
    Success(ExtractionRecord),
    Failure {
        document_id: String,
        error_message: String,
    },
}

impl ProcessingOutcome {
    pub fn document_id(&self) -> &str {
        match self {
            ProcessingOutcome::Success(record) => &record.document_id,
            ProcessingOutcome::Failure { document_id, .. } => document_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success(_))
    }
}
