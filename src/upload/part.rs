//! Part upload
//!
//! Sends one part and returns its descriptor. The uploader is stateless and
//! never retries; the orchestrator decides what a failure means.

use super::UploadError;
use crate::api::{ApiError, PartDescriptor, PartUpload, ResourceApi};
use bytes::Bytes;
use std::time::Duration;

/// Uploads single parts of one chunked upload
pub struct PartUploader<'a, A: ?Sized> {
    api: &'a A,
    file_name: &'a str,
    timeout: Option<Duration>,
}

impl<'a, A: ResourceApi + ?Sized> PartUploader<'a, A> {
    pub fn new(api: &'a A, file_name: &'a str, timeout: Option<Duration>) -> Self {
        Self {
            api,
            file_name,
            timeout,
        }
    }

    /// Upload one part of the object `key` in upload `upload_id`
    pub async fn upload(
        &self,
        bytes: Bytes,
        part_number: u32,
        upload_id: &str,
        key: &str,
    ) -> Result<PartDescriptor, UploadError> {
        let request = PartUpload {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            part_number,
            file_name: self.file_name.to_string(),
            bytes,
        };

        let call = self.api.upload_part(request);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout(limit)),
            },
            None => call.await,
        };

        Ok(result?)
    }
}

/// Descriptors of uploaded parts, kept in ascending, gapless part order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedParts {
    parts: Vec<PartDescriptor>,
}

impl CompletedParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parts: Vec::with_capacity(capacity),
        }
    }

    /// Append the next part. Only `len() + 1` is accepted.
    pub fn push(&mut self, part: PartDescriptor) -> Result<(), UploadError> {
        let expected = self.parts.len() as u32 + 1;
        if part.part_number != expected {
            return Err(UploadError::PartOrder {
                expected,
                got: part.part_number,
            });
        }
        self.parts.push(part);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn part_numbers(&self) -> Vec<u32> {
        self.parts.iter().map(|p| p.part_number).collect()
    }

    pub fn into_vec(self) -> Vec<PartDescriptor> {
        self.parts
    }
}
