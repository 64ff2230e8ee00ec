//! HTTP implementation of the resource API
//!
//! # Example
//!
//! ```no_run
//! use resource_uploadr::api::{ApiClientConfig, HttpResourceApi, InitiateRequest, ResourceApi};
//! use resource_uploadr::upload::ResourceType;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpResourceApi::new(ApiClientConfig::new("http://localhost:3000"))?;
//! let upload = api
//!     .initiate(InitiateRequest {
//!         batch_name: "rust-2024".into(),
//!         resource_type: ResourceType::Recording,
//!         file_name: "lecture-01.mp4".into(),
//!     })
//!     .await?;
//! println!("upload id: {}", upload.upload_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | Direct upload | `api.direct_upload` | file name, bytes, resource type, status_code |
//! | Initiate | `api.initiate` | file name, resource type, status_code |
//! | Upload part | `api.upload_part` | upload_id, part_number, bytes, status_code |
//! | Complete | `api.complete` | upload_id, parts_count, status_code |

use super::{
    ApiError, CompleteRequest, DirectUpload, Envelope, InitiateRequest, InitiatedUpload,
    PartDescriptor, PartUpload, Resource, ResourceApi,
};
use crate::config::{ApiConfig, EndpointsConfig};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Resource API client configuration
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub request_timeout: Option<Duration>,
    pub endpoints: EndpointsConfig,
}

impl ApiClientConfig {
    /// Default endpoints, no token, no timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            request_timeout: None,
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            bearer_token: config
                .bearer_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            request_timeout: match config.request_timeout_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            endpoints: config.endpoints.clone(),
        }
    }
}

/// Resource API over HTTP
pub struct HttpResourceApi {
    config: ApiClientConfig,
    http_client: reqwest::Client,
}

impl HttpResourceApi {
    /// Create a new client
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.http_client.post(self.url(path));
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            if let Some(reason) = rejection(&body) {
                tracing::warn!(status = status.as_u16(), reason = %reason, "Request rejected");
                return Err(ApiError::Rejected(reason));
            }
            let message = String::from_utf8_lossy(&body).trim().to_string();
            tracing::warn!(status = status.as_u16(), message = %message, "Request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.into_result()
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        match self.config.request_timeout {
            Some(timeout) if err.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Transport(err.to_string()),
        }
    }
}

/// The server's reason when the body is a `success: false` envelope
fn rejection(body: &Bytes) -> Option<String> {
    let envelope = serde_json::from_slice::<Envelope<serde_json::Value>>(body).ok()?;
    if envelope.success {
        return None;
    }
    Some(
        envelope
            .error
            .unwrap_or_else(|| "Request was not successful".to_string()),
    )
}

fn file_part(file_name: &str, bytes: Bytes) -> Part {
    let len = bytes.len() as u64;
    Part::stream_with_length(bytes, len).file_name(file_name.to_string())
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    #[tracing::instrument(
        name = "api.direct_upload",
        skip(self, upload),
        fields(
            file.name = %upload.file_name,
            upload.bytes = upload.bytes.len(),
            resource.kind = %upload.resource_type,
            http.method = "POST",
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn direct_upload(&self, upload: DirectUpload) -> Result<Resource, ApiError> {
        let DirectUpload {
            file_name,
            bytes,
            metadata,
            resource_type,
        } = upload;

        let form = Form::new()
            .part("file", file_part(&file_name, bytes))
            .text("title", metadata.title)
            .text("description", metadata.description)
            .text("batchId", metadata.batch_id)
            .text("uploadedById", metadata.uploader_id)
            .text("resourceType", resource_type.as_str());

        let resource: Resource = self
            .send(self.post(&self.config.endpoints.direct_upload).multipart(form))
            .await?;

        tracing::info!(file_name = %file_name, "Direct upload completed");
        Ok(resource)
    }

    #[tracing::instrument(
        name = "api.initiate",
        skip(self, request),
        fields(
            file.name = %request.file_name,
            resource.kind = %request.resource_type,
            http.method = "POST",
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn initiate(&self, request: InitiateRequest) -> Result<InitiatedUpload, ApiError> {
        let upload: InitiatedUpload = self
            .send(self.post(&self.config.endpoints.initiate).json(&request))
            .await?;

        tracing::info!(
            upload_id = %upload.upload_id,
            key = %upload.key,
            "Chunked upload initiated"
        );
        Ok(upload)
    }

    #[tracing::instrument(
        name = "api.upload_part",
        skip(self, part),
        fields(
            upload_id = %part.upload_id,
            part_number = part.part_number,
            upload.bytes = part.bytes.len(),
            http.method = "POST",
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn upload_part(&self, part: PartUpload) -> Result<PartDescriptor, ApiError> {
        let PartUpload {
            key,
            upload_id,
            part_number,
            file_name,
            bytes,
        } = part;

        let form = Form::new()
            .part("file", file_part(&file_name, bytes))
            .text("key", key)
            .text("uploadId", upload_id)
            .text("partNumber", part_number.to_string());

        let body: serde_json::Value = self
            .send(self.post(&self.config.endpoints.upload_part).multipart(form))
            .await?;

        Ok(PartDescriptor { part_number, body })
    }

    #[tracing::instrument(
        name = "api.complete",
        skip(self, request),
        fields(
            upload_id = %request.upload_id,
            parts_count = request.parts.len(),
            http.method = "POST",
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn complete(&self, request: CompleteRequest) -> Result<Resource, ApiError> {
        let resource: Resource = self
            .send(self.post(&self.config.endpoints.complete).json(&request))
            .await?;

        tracing::info!(upload_id = %request.upload_id, "Chunked upload completed");
        Ok(resource)
    }
}
