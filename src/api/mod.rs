//! Resource API
//!
//! The four server calls the upload pipeline depends on, and their wire types.
//!
//! | Call | Method | Body |
//! |------|--------|------|
//! | Direct upload | POST | multipart: file, title, description, batchId, uploadedById, resourceType |
//! | Initiate | POST | JSON: batchName, resourceType, fileName |
//! | Upload part | POST | multipart: file, key, uploadId, partNumber |
//! | Complete | POST | JSON: key, uploadId, parts, batchId, title, description, uploadedById, resourceType |
//!
//! Every response is wrapped in `{success, data?, error?}`. A `success: false`
//! body is a rejection whatever the HTTP status; any other non-2xx response
//! is a status error.

use crate::upload::{ResourceType, UploadMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod client;

pub use client::{ApiClientConfig, HttpResourceApi};

/// Resource API errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// `success: false` with the server's reason
    #[error("{0}")]
    Rejected(String),

    #[error("Response error: {0}")]
    Decode(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Uniform response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap `data`, treating `success: false` as a rejection
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Decode("Response is missing data".into()))
    }
}

/// Stored resource record returned by direct upload and complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Whole-file upload with metadata
#[derive(Debug, Clone)]
pub struct DirectUpload {
    pub file_name: String,
    pub bytes: Bytes,
    pub metadata: UploadMetadata,
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub batch_name: String,
    pub resource_type: ResourceType,
    pub file_name: String,
}

/// Identifiers of a chunked upload in progress on the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedUpload {
    pub key: String,
    pub upload_id: String,
}

/// One part's bytes and the upload it belongs to
#[derive(Debug, Clone)]
pub struct PartUpload {
    pub key: String,
    pub upload_id: String,
    pub part_number: u32,
    pub file_name: String,
    pub bytes: Bytes,
}

/// Server acknowledgement of one part.
///
/// The body is opaque and is sent back unchanged on completion; the part
/// number is the one the client uploaded it under.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    pub part_number: u32,
    pub body: serde_json::Value,
}

impl Serialize for PartDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub key: String,
    pub upload_id: String,
    pub parts: Vec<PartDescriptor>,
    pub batch_id: String,
    pub title: String,
    pub description: String,
    pub uploaded_by_id: String,
    pub resource_type: ResourceType,
}

/// Server calls used by the upload pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Single request carrying the whole file and its metadata
    async fn direct_upload(&self, upload: DirectUpload) -> Result<Resource, ApiError>;

    /// Start a chunked upload
    async fn initiate(&self, request: InitiateRequest) -> Result<InitiatedUpload, ApiError>;

    /// Send one part. Stateless; never retries.
    async fn upload_part(&self, part: PartUpload) -> Result<PartDescriptor, ApiError>;

    /// Assemble uploaded parts into the stored resource
    async fn complete(&self, request: CompleteRequest) -> Result<Resource, ApiError>;
}
