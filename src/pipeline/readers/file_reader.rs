use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::data_model::{ContentSource, FileType, WorkItem};
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::base_reader::BaseReader;
use crate::pipeline::readers::docx_reader::extract_docx_text;
use crate::services::{OcrInput, OcrService};
use crate::utils::prometheus_metrics::OCR_REQUEST_DURATION_SECONDS;

/// Reads text, Word and PDF documents. PDFs go through the OCR service.
pub struct FileReader {
    ocr: Option<Arc<dyn OcrService>>,
}

impl FileReader {
    pub fn new(ocr: Option<Arc<dyn OcrService>>) -> Self {
        FileReader { ocr }
    }

    async fn ocr_text(&self, input: OcrInput<'_>) -> Result<String> {
        let ocr = self.ocr.as_ref().ok_or_else(|| {
            PipelineError::ReadError("Document Intelligence not configured".to_string())
        })?;
        let timer = OCR_REQUEST_DURATION_SECONDS.start_timer();
        let lines = ocr
            .extract_text(input)
            .await
            .map_err(|e| PipelineError::ReadError(format!("PDF text extraction failed: {}", e)))?;
        timer.observe_duration();
        Ok(lines.join("\n"))
    }

    async fn decode(&self, file_type: FileType, bytes: &[u8]) -> Result<String> {
        match file_type {
            FileType::PlainText => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    PipelineError::ReadError(format!("File is not valid UTF-8: {}", e))
                })?;
                Ok(text.trim_start_matches('\u{feff}').to_string())
            }
            FileType::WordDocument => extract_docx_text(bytes),
            FileType::Pdf => self.ocr_text(OcrInput::Bytes(bytes)).await,
        }
    }
}

#[async_trait]
impl BaseReader for FileReader {
    async fn read(&self, item: &WorkItem) -> Result<String> {
        let file_type = item.file_type()?;

        let text = match item.content() {
            ContentSource::Unavailable(reason) => {
                return Err(PipelineError::ReadError(reason.clone()));
            }
            ContentSource::Bytes(bytes) => self.decode(file_type, bytes).await?,
            ContentSource::LocalPath(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    PipelineError::ReadError(format!("Could not open {}: {}", path.display(), e))
                })?;
                self.decode(file_type, &bytes).await?
            }
            ContentSource::Reference(url) => match file_type {
                FileType::Pdf => self.ocr_text(OcrInput::Reference(url)).await?,
                other => {
                    return Err(PipelineError::ReadError(format!(
                        "Direct references are only read for PDF files, got .{}",
                        other.extension()
                    )))
                }
            },
        };

        if text.trim().is_empty() {
            return Err(PipelineError::ReadError(
                "No text could be extracted".to_string(),
            ));
        }

        debug!(doc_id = %item.id(), chars = text.chars().count(), "Document read");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedOcr {
        lines: Vec<String>,
        seen_reference: Mutex<Option<String>>,
    }

    #[async_trait]
    impl OcrService for FixedOcr {
        async fn extract_text(&self, input: OcrInput<'_>) -> Result<Vec<String>> {
            if let OcrInput::Reference(url) = input {
                *self.seen_reference.lock().unwrap() = Some(url.to_string());
            }
            Ok(self.lines.clone())
        }
    }

    fn ocr(lines: &[&str]) -> Arc<FixedOcr> {
        Arc::new(FixedOcr {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            seen_reference: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn test_plain_text_bytes() {
        let reader = FileReader::new(None);
        let item = WorkItem::from_bytes("a.txt", "Umowa dostawy".as_bytes().to_vec());
        assert_eq!(reader.read(&item).await.unwrap(), "Umowa dostawy");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_read_error() {
        let reader = FileReader::new(None);
        let item = WorkItem::from_bytes("a.txt", vec![0xff, 0xfe, 0x00]);
        let err = reader.read(&item).await.unwrap_err();
        assert!(matches!(err, PipelineError::ReadError(_)));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let reader = FileReader::new(None);
        let item = WorkItem::from_bytes("sheet.xlsx", vec![1, 2, 3]);
        let err = reader.read(&item).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn test_pdf_without_ocr() {
        let reader = FileReader::new(None);
        let item = WorkItem::from_bytes("scan.pdf", b"%PDF-1.7".to_vec());
        let err = reader.read(&item).await.unwrap_err();
        assert_eq!(err.to_string(), "Read error: Document Intelligence not configured");
    }

    #[tokio::test]
    async fn test_pdf_reference_goes_to_ocr() {
        let service = ocr(&["Page one", "Page two"]);
        let reader = FileReader::new(Some(service.clone()));
        let item = WorkItem::from_reference("scan.pdf", "https://store/docs/scan.pdf");
        assert_eq!(reader.read(&item).await.unwrap(), "Page one\nPage two");
        assert_eq!(
            service.seen_reference.lock().unwrap().as_deref(),
            Some("https://store/docs/scan.pdf")
        );
    }

    #[tokio::test]
    async fn test_empty_ocr_output_is_read_error() {
        let reader = FileReader::new(Some(ocr(&[])));
        let item = WorkItem::from_bytes("blank.pdf", b"%PDF".to_vec());
        assert!(matches!(
            reader.read(&item).await,
            Err(PipelineError::ReadError(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable_content() {
        let reader = FileReader::new(None);
        let item = WorkItem::unavailable("lost.txt", "download failed (404 Not Found)");
        let err = reader.read(&item).await.unwrap_err();
        assert_eq!(err.to_string(), "Read error: download failed (404 Not Found)");
    }

    #[tokio::test]
    async fn test_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nda.txt");
        std::fs::write(&path, "\u{feff}Sekretessavtal").unwrap();
        let reader = FileReader::new(None);
        let item = WorkItem::from_path("nda.txt", &path);
        assert_eq!(reader.read(&item).await.unwrap(), "Sekretessavtal");
    }
}
