//! Object storage holding the source contracts and the markdown archive.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::services::StorageSettings;
use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::SERVICE_ERRORS_TOTAL;

const SERVICE_NAME: &str = "Blob Storage";
const STORAGE_API_VERSION: &str = "2021-08-06";

/// Listing entry for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocumentInfo {
    pub name: String,
    pub size: Option<u64>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All objects in `container`, following pagination.
    async fn list_documents(&self, container: &str) -> Result<Vec<StoredDocumentInfo>>;

    async fn fetch(&self, container: &str, name: &str) -> Result<Vec<u8>>;

    /// A URL another service can use to read the object directly.
    fn resolve_reference(&self, container: &str, name: &str) -> Result<String>;

    async fn upload(
        &self,
        container: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Creates the container when it does not exist yet.
    async fn ensure_container(&self, container: &str) -> Result<()>;

    /// Human readable location, used in log lines and diagnostics.
    fn describe(&self, container: &str) -> String;
}

/// One page of a List Blobs response and the marker for the next page.
pub fn parse_blob_listing(xml: &str) -> Result<(Vec<StoredDocumentInfo>, Option<String>)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut blobs = Vec::new();
    let mut next_marker = None;
    let mut name: Option<String> = None;
    let mut size: Option<u64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if tag == "Blob" {
                    name = None;
                    size = None;
                }
                path.push(tag);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| PipelineError::ServiceError {
                    service: SERVICE_NAME,
                    message: format!("invalid listing text: {}", err),
                })?;
                match path.last().map(String::as_str) {
                    Some("Name") if path.iter().any(|p| p == "Blob") => {
                        name = Some(text.into_owned());
                    }
                    Some("Content-Length") => size = text.trim().parse().ok(),
                    Some("NextMarker") if !text.trim().is_empty() => {
                        next_marker = Some(text.into_owned());
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"Blob" {
                    if let Some(n) = name.take() {
                        blobs.push(StoredDocumentInfo {
                            name: n,
                            size: size.take(),
                        });
                    }
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PipelineError::ServiceError {
                    service: SERVICE_NAME,
                    message: format!(
                        "malformed listing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    ),
                })
            }
            _ => {}
        }
    }

    Ok((blobs, next_marker))
}

/// Azure Blob Storage over REST, authorised by SAS token or bearer token.
pub struct BlobStorageClient {
    http: Client,
    settings: StorageSettings,
}

impl BlobStorageClient {
    pub fn new(settings: StorageSettings) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self { http, settings })
    }

    fn url(&self, container: &str, name: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.settings.base_url()).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Invalid storage endpoint '{}': {}",
                self.settings.base_url(),
                e
            ))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PipelineError::ConfigError("Storage endpoint cannot be a base URL".to_string())
            })?;
            segments.pop_if_empty().push(container);
            if let Some(name) = name {
                segments.extend(name.split('/'));
            }
        }
        // SAS tokens arrive already encoded; set them verbatim before adding pairs.
        if let Some(sas) = &self.settings.sas_token {
            url.set_query(Some(sas.trim_start_matches('?')));
        }
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("x-ms-version", STORAGE_API_VERSION);
        match (&self.settings.sas_token, &self.settings.bearer_token) {
            (None, Some(token)) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    fn service_error(message: String) -> PipelineError {
        SERVICE_ERRORS_TOTAL.with_label_values(&["storage"]).inc();
        PipelineError::ServiceError {
            service: SERVICE_NAME,
            message,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| Self::service_error(format!("{} failed: {}", what, e.without_url())))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Self::service_error(format!(
            "{} failed ({}): {}",
            what, status, body
        )))
    }
}

#[async_trait]
impl ObjectStore for BlobStorageClient {
    async fn list_documents(&self, container: &str) -> Result<Vec<StoredDocumentInfo>> {
        let mut all = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut url = self.url(container, None)?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("restype", "container");
                pairs.append_pair("comp", "list");
                if let Some(m) = &marker {
                    pairs.append_pair("marker", m);
                }
            }
            let response = self.send(self.http.get(url), "listing").await?;
            let body = response.text().await?;
            let (page, next) = parse_blob_listing(&body)?;
            debug!(container, page_size = page.len(), "Fetched listing page");
            all.extend(page);
            match next {
                Some(m) => marker = Some(m),
                None => break,
            }
        }

        Ok(all)
    }

    async fn fetch(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let url = self.url(container, Some(name))?;
        let response = self.send(self.http.get(url), "download").await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn resolve_reference(&self, container: &str, name: &str) -> Result<String> {
        Ok(self.url(container, Some(name))?.to_string())
    }

    async fn upload(
        &self,
        container: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.url(container, Some(name))?;
        let builder = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, content_type)
            .body(data);
        self.send(builder, "upload").await?;
        Ok(())
    }

    async fn ensure_container(&self, container: &str) -> Result<()> {
        let mut url = self.url(container, None)?;
        url.query_pairs_mut().append_pair("restype", "container");
        let response = self
            .authorize(self.http.put(url))
            .send()
            .await
            .map_err(|e| {
                Self::service_error(format!("container creation failed: {}", e.without_url()))
            })?;
        match response.status() {
            s if s.is_success() => {
                info!(container, "Created storage container");
                Ok(())
            }
            StatusCode::CONFLICT => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Self::service_error(format!(
                    "container creation failed ({}): {}",
                    status, body
                )))
            }
        }
    }

    fn describe(&self, container: &str) -> String {
        format!("{}/{}", self.settings.base_url(), container)
    }
}
