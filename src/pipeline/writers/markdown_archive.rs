use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::data_model::extension_of;
use crate::error::Result;
use crate::services::ObjectStore;
use crate::utils::prometheus_metrics::MARKDOWN_UPLOAD_ERRORS_TOTAL;

/// Replaces the extension of the final component with `.md`.
pub fn markdown_name(document_id: &str) -> String {
    let ext = extension_of(document_id);
    if ext.is_empty() {
        format!("{}.md", document_id)
    } else {
        format!("{}.md", &document_id[..document_id.len() - ext.len() - 1])
    }
}

pub fn render_markdown(document_id: &str, text: &str, extracted_at: &str) -> String {
    format!(
        "# Extracted Text\n\n**Source File:** {}\n\n**Extraction Date:** {}\n\n---\n\n{}",
        document_id, extracted_at, text
    )
}

/// Uploads the extracted text of each document as markdown. Failures are
/// logged and never reach the caller.
pub struct MarkdownArchive {
    store: Arc<dyn ObjectStore>,
    container: String,
    container_ready: OnceCell<()>,
}

impl MarkdownArchive {
    pub fn new(store: Arc<dyn ObjectStore>, container: impl Into<String>) -> Self {
        MarkdownArchive {
            store,
            container: container.into(),
            container_ready: OnceCell::new(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub async fn archive(&self, document_id: &str, text: &str) {
        if let Err(e) = self.try_archive(document_id, text).await {
            MARKDOWN_UPLOAD_ERRORS_TOTAL.inc();
            warn!(doc_id = %document_id, error = %e, "Could not save extracted text as markdown");
        }
    }

    async fn try_archive(&self, document_id: &str, text: &str) -> Result<()> {
        self.container_ready
            .get_or_try_init(|| self.store.ensure_container(&self.container))
            .await?;

        let name = markdown_name(document_id);
        let body = render_markdown(document_id, text, &Utc::now().to_rfc3339());
        self.store
            .upload(
                &self.container,
                &name,
                body.into_bytes(),
                "text/markdown; charset=utf-8",
            )
            .await?;
        debug!(doc_id = %document_id, markdown = %name, "Saved markdown copy");
        Ok(())
    }
}
