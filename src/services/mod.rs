// External collaborators: the LLM, the OCR service and object storage.

pub mod llm;
pub mod object_store;
pub mod ocr;

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::services::ServiceSettings;
use crate::error::Result;

pub use llm::{AzureOpenAiClient, CompletionRequest, LlmService};
pub use object_store::{BlobStorageClient, ObjectStore, StoredDocumentInfo};
pub use ocr::{DocumentIntelligenceClient, OcrInput, OcrService};

/// Shared handles to every configured service.
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmService>,
    pub ocr: Option<Arc<dyn OcrService>>,
    pub store: Option<Arc<dyn ObjectStore>>,
}

impl Services {
    pub fn new(
        llm: Arc<dyn LlmService>,
        ocr: Option<Arc<dyn OcrService>>,
        store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        Services { llm, ocr, store }
    }

    /// Builds the Azure adapters for whatever the settings configure.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self> {
        let llm: Arc<dyn LlmService> = Arc::new(AzureOpenAiClient::new(settings.openai.clone())?);
        info!(deployment = %settings.openai.deployment, "Azure OpenAI client ready");

        let ocr: Option<Arc<dyn OcrService>> = match &settings.document_intelligence {
            Some(di) => {
                info!(endpoint = %di.endpoint, "Document Intelligence client ready");
                Some(Arc::new(DocumentIntelligenceClient::new(di.clone())?))
            }
            None => {
                warn!("Document Intelligence not configured; PDF files will fail");
                None
            }
        };

        let store: Option<Arc<dyn ObjectStore>> = match &settings.storage {
            Some(storage) => {
                info!(account = %storage.account_name, "Blob Storage client ready");
                Some(Arc::new(BlobStorageClient::new(storage.clone())?))
            }
            None => None,
        };

        Ok(Services { llm, ocr, store })
    }
}
