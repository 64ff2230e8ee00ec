//! Upload session
//!
//! One attempt at uploading one file. Sessions are never reused: a failed or
//! completed session is discarded and a retry starts a new one.

use super::{ResourceType, UploadError, UploadFile, UploadMetadata, UploadMode};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// User-visible upload state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Idle,
    Uploading,
    Completed,
    Failed,
}

impl UploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Uploading => "uploading",
            UploadState::Completed => "completed",
            UploadState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Completed | UploadState::Failed)
    }

    /// `idle -> uploading -> {completed, failed}`
    pub fn can_transition_to(&self, next: UploadState) -> bool {
        matches!(
            (self, next),
            (UploadState::Idle, UploadState::Uploading)
                | (UploadState::Uploading, UploadState::Completed)
                | (UploadState::Uploading, UploadState::Failed)
        )
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single upload attempt
#[derive(Debug, Clone)]
pub struct UploadSession {
    id: Uuid,
    file: UploadFile,
    resource_type: ResourceType,
    metadata: UploadMetadata,
    state: UploadState,
}

impl UploadSession {
    /// Create an idle session. Callers validate file and metadata first;
    /// see [`super::UploadForm::submit`].
    pub fn new(file: UploadFile, resource_type: ResourceType, metadata: UploadMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            resource_type,
            metadata,
            state: UploadState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file(&self) -> &UploadFile {
        &self.file
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn metadata(&self) -> &UploadMetadata {
        &self.metadata
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Direct or chunked, derived from the file size
    pub fn mode(&self, part_size: u64) -> UploadMode {
        UploadMode::for_size(self.file.size(), part_size)
    }

    /// Move to `next`, rejecting transitions the state machine does not allow
    pub(crate) fn transition(&mut self, next: UploadState) -> Result<(), UploadError> {
        if !self.state.can_transition_to(next) {
            return Err(UploadError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(session = %self.id, from = %self.state, to = %next, "Session transition");
        self.state = next;
        Ok(())
    }
}
