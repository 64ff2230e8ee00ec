//! Upload module
//!
//! Client side of the resource upload pipeline. Small files go out in a single
//! direct request; anything larger than the part size is split into parts and
//! committed through the initiate / upload-part / complete protocol.

use crate::api::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub mod chunker;
pub mod form;
pub mod observer;
pub mod orchestrator;
pub mod part;
pub mod progress;
pub mod session;
pub mod source;
pub mod validator;

pub use chunker::{Chunker, PartRange};
pub use form::UploadForm;
pub use observer::{CancelToken, LoggingObserver, NoopObserver, UploadObserver};
pub use orchestrator::UploadOrchestrator;
pub use part::{CompletedParts, PartUploader};
pub use progress::{Eta, ProgressSnapshot, ProgressTracker};
pub use session::{UploadSession, UploadState};
pub use source::UploadFile;
pub use validator::Validator;

/// Default part size (5MB)
pub const CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Default hard cap on file size (1GB)
pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Minimum size the server accepts for every part except the last
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Default per-part timeout
pub const DEFAULT_PART_TIMEOUT: Duration = Duration::from_secs(120);

/// Reasons a file or form is rejected before any network activity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File is {size} bytes, exceeding the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("'{extension}' files are not accepted for {resource_type} uploads")]
    UnsupportedType {
        extension: String,
        resource_type: ResourceType,
    },

    #[error("File is empty")]
    EmptyFile,

    #[error("No file selected")]
    NoFile,

    #[error("Missing required field: {0}")]
    MissingMetadata(&'static str),
}

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    TransientNetwork(String),

    /// Business rejection from the server, message kept verbatim
    #[error("{0}")]
    Protocol(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: UploadState, to: UploadState },

    #[error("Part {got} submitted out of order (expected part {expected})")]
    PartOrder { expected: u32, got: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl UploadError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "validation",
            UploadError::TransientNetwork(_) => "network",
            UploadError::Protocol(_) => "protocol",
            UploadError::Cancelled => "cancelled",
            UploadError::InvalidTransition { .. } => "state",
            UploadError::PartOrder { .. } => "part_order",
            UploadError::IoError(_) => "io",
        }
    }
}

impl From<ApiError> for UploadError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected(message) => UploadError::Protocol(message),
            other => UploadError::TransientNetwork(other.to_string()),
        }
    }
}

/// Kind of resource being uploaded; decides which extensions are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Assignment,
    Recording,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Assignment => "assignment",
            ResourceType::Recording => "recording",
        }
    }

    /// Lowercase extensions accepted for this resource type
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            ResourceType::Assignment => &["pdf", "doc", "docx", "ppt", "pptx", "txt", "rtf", "odt"],
            ResourceType::Recording => &["mp4", "mov", "avi"],
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown resource type '{0}': must be 'assignment' or 'recording'")]
pub struct ParseResourceTypeError(String);

impl FromStr for ResourceType {
    type Err = ParseResourceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assignment" => Ok(ResourceType::Assignment),
            "recording" => Ok(ResourceType::Recording),
            _ => Err(ParseResourceTypeError(s.to_string())),
        }
    }
}

/// Upload path, derived from file size and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    Direct,
    Chunked,
}

impl UploadMode {
    /// `Direct` iff `size <= part_size`; a file of exactly one part goes direct.
    pub fn for_size(size: u64, part_size: u64) -> Self {
        if size <= part_size {
            UploadMode::Direct
        } else {
            UploadMode::Chunked
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::Direct => "direct",
            UploadMode::Chunked => "chunked",
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-supplied details attached to the stored resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub batch_id: String,
    pub batch_name: String,
    pub uploader_id: String,
}

impl UploadMetadata {
    /// Check that every required field is non-blank. `description` is optional.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("title", &self.title),
            ("batch_id", &self.batch_id),
            ("batch_name", &self.batch_name),
            ("uploader_id", &self.uploader_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingMetadata(field));
            }
        }
        Ok(())
    }
}

/// Protocol constants handed to the orchestrator at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub part_size: u64,
    pub max_file_size: u64,
    /// `None` lets a stalled part block forever
    pub part_timeout: Option<Duration>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            part_size: CHUNK_SIZE,
            max_file_size: MAX_FILE_SIZE,
            part_timeout: Some(DEFAULT_PART_TIMEOUT),
        }
    }
}
