use crate::error::{PipelineError, Result};

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_OPENAI_API_VERSION: &str = "2025-01-01-preview";

/// Credential sent to an Azure endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AzureAuth {
    /// `api-key` header (OpenAI) or `Ocp-Apim-Subscription-Key` (Document Intelligence).
    ApiKey(String),
    /// Pre-acquired Entra ID access token sent as `Authorization: Bearer`.
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub auth: AzureAuth,
}

#[derive(Debug, Clone)]
pub struct DocumentIntelligenceSettings {
    pub endpoint: String,
    pub auth: AzureAuth,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub account_name: String,
    /// Overrides `https://{account}.blob.core.windows.net`.
    pub endpoint: Option<String>,
    pub sas_token: Option<String>,
    pub bearer_token: Option<String>,
}

impl StorageSettings {
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account_name),
        }
    }
}

/// Endpoints and credentials for the external services. Only the LLM is
/// mandatory; OCR and storage are optional and their absence disables PDFs and
/// the object-store source respectively.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub openai: OpenAiSettings,
    pub document_intelligence: Option<DocumentIntelligenceSettings>,
    pub storage: Option<StorageSettings>,
}

impl ServiceSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let shared_token = get("AZURE_AD_TOKEN");

        let endpoint = get("AZURE_OPENAI_ENDPOINT").ok_or_else(|| {
            PipelineError::ConfigError("AZURE_OPENAI_ENDPOINT is not set".to_string())
        })?;
        let auth = match (get("AZURE_OPENAI_API_KEY"), shared_token.clone()) {
            (Some(key), _) => AzureAuth::ApiKey(key),
            (None, Some(token)) => AzureAuth::Bearer(token),
            (None, None) => {
                return Err(PipelineError::ConfigError(
                    "Set AZURE_OPENAI_API_KEY or AZURE_AD_TOKEN for Azure OpenAI".to_string(),
                ))
            }
        };
        let openai = OpenAiSettings {
            endpoint,
            deployment: get("AZURE_OPENAI_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            api_version: get("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_VERSION.to_string()),
            auth,
        };

        let document_intelligence = get("DOCUMENT_INTELLIGENCE_ENDPOINT").and_then(|endpoint| {
            let auth = get("DOCUMENT_INTELLIGENCE_KEY")
                .map(AzureAuth::ApiKey)
                .or_else(|| shared_token.clone().map(AzureAuth::Bearer))?;
            Some(DocumentIntelligenceSettings { endpoint, auth })
        });

        let storage = get("STORAGE_ACCOUNT_NAME").map(|account_name| StorageSettings {
            account_name,
            endpoint: get("STORAGE_ENDPOINT"),
            sas_token: get("STORAGE_SAS_TOKEN"),
            bearer_token: shared_token.clone(),
        });

        Ok(ServiceSettings {
            openai,
            document_intelligence,
            storage,
        })
    }
}
