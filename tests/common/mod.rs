//! Shared test doubles for upload flow tests
//!
//! - `RecordingApi`: a `ResourceApi` that records every call and can be told
//!   to fail at a given step
//! - `RecordingObserver`: collects observer events

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use resource_uploadr::api::{
    ApiError, CompleteRequest, DirectUpload, InitiateRequest, InitiatedUpload, PartDescriptor,
    PartUpload, Resource, ResourceApi,
};
use resource_uploadr::upload::{
    CancelToken, ProgressSnapshot, UploadError, UploadFile, UploadMetadata, UploadObserver,
    UploadState,
};
use serde_json::json;
use std::sync::Mutex;

pub const MB: usize = 1024 * 1024;

/// One call received by the fake server
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Direct {
        file_name: String,
        bytes: usize,
        title: String,
        batch_id: String,
    },
    Initiate {
        file_name: String,
        batch_name: String,
    },
    Part {
        part_number: u32,
        bytes: usize,
    },
    Complete {
        part_numbers: Vec<u32>,
        upload_id: String,
    },
}

#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_initiate: Option<ApiError>,
    fail_part: Option<(u32, ApiError)>,
    fail_complete: Option<ApiError>,
    fail_direct: Mutex<Option<ApiError>>,
    cancel_during_part: Option<(u32, CancelToken)>,
    cancel_during_direct: Option<CancelToken>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_initiate(mut self, err: ApiError) -> Self {
        self.fail_initiate = Some(err);
        self
    }

    pub fn failing_part(mut self, part_number: u32, err: ApiError) -> Self {
        self.fail_part = Some((part_number, err));
        self
    }

    pub fn failing_complete(mut self, err: ApiError) -> Self {
        self.fail_complete = Some(err);
        self
    }

    /// Fail the next direct upload only
    pub fn failing_direct_once(self, err: ApiError) -> Self {
        *self.fail_direct.lock().unwrap() = Some(err);
        self
    }

    /// Trip `token` while part `part_number` is in flight; the part itself succeeds
    pub fn cancelling_during_part(mut self, part_number: u32, token: CancelToken) -> Self {
        self.cancel_during_part = Some((part_number, token));
        self
    }

    /// Trip `token` while the direct upload is in flight; the upload itself succeeds
    pub fn cancelling_during_direct(mut self, token: CancelToken) -> Self {
        self.cancel_during_direct = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn resource(title: &str) -> Resource {
    serde_json::from_value(json!({"id": 101, "title": title})).unwrap()
}

#[async_trait]
impl ResourceApi for RecordingApi {
    async fn direct_upload(&self, upload: DirectUpload) -> Result<Resource, ApiError> {
        self.record(Call::Direct {
            file_name: upload.file_name.clone(),
            bytes: upload.bytes.len(),
            title: upload.metadata.title.clone(),
            batch_id: upload.metadata.batch_id.clone(),
        });
        if let Some(err) = self.fail_direct.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(token) = &self.cancel_during_direct {
            token.cancel();
        }
        Ok(resource(&upload.metadata.title))
    }

    async fn initiate(&self, request: InitiateRequest) -> Result<InitiatedUpload, ApiError> {
        self.record(Call::Initiate {
            file_name: request.file_name.clone(),
            batch_name: request.batch_name.clone(),
        });
        if let Some(err) = &self.fail_initiate {
            return Err(err.clone());
        }
        Ok(InitiatedUpload {
            key: format!("batches/{}/{}", request.batch_name, request.file_name),
            upload_id: "upload-1".into(),
        })
    }

    async fn upload_part(&self, part: PartUpload) -> Result<PartDescriptor, ApiError> {
        self.record(Call::Part {
            part_number: part.part_number,
            bytes: part.bytes.len(),
        });
        if let Some((number, token)) = &self.cancel_during_part {
            if *number == part.part_number {
                token.cancel();
            }
        }
        if let Some((number, err)) = &self.fail_part {
            if *number == part.part_number {
                return Err(err.clone());
            }
        }
        Ok(PartDescriptor {
            part_number: part.part_number,
            body: json!({"PartNumber": part.part_number, "ETag": format!("\"etag-{}\"", part.part_number)}),
        })
    }

    async fn complete(&self, request: CompleteRequest) -> Result<Resource, ApiError> {
        self.record(Call::Complete {
            part_numbers: request.parts.iter().map(|p| p.part_number).collect(),
            upload_id: request.upload_id.clone(),
        });
        if let Some(err) = &self.fail_complete {
            return Err(err.clone());
        }
        Ok(resource(&request.title))
    }
}

/// Event seen by the observer
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    State(UploadState),
    Progress(ProgressSnapshot),
    Part(u32, u32),
    Success,
    Failure(String),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<UploadState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn percentages(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(p.percentage),
                _ => None,
            })
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.events().iter().filter(|e| **e == Event::Success).count()
    }
}

impl UploadObserver for RecordingObserver {
    fn on_state_change(&self, state: UploadState) {
        self.events.lock().unwrap().push(Event::State(state));
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.events.lock().unwrap().push(Event::Progress(*snapshot));
    }

    fn on_part_uploaded(&self, part_number: u32, total_parts: u32) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Part(part_number, total_parts));
    }

    fn on_success(&self, _resource: &Resource) {
        self.events.lock().unwrap().push(Event::Success);
    }

    fn on_failure(&self, error: &UploadError) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Failure(error.to_string()));
    }
}

/// In-memory file of `size` bytes
pub fn file(name: &str, size: usize) -> UploadFile {
    UploadFile::from_bytes(name, Bytes::from(vec![7u8; size]))
}

pub fn metadata(title: &str) -> UploadMetadata {
    UploadMetadata {
        title: title.to_string(),
        description: "Course material".into(),
        batch_id: "7".into(),
        batch_name: "rust-2024".into(),
        uploader_id: "42".into(),
    }
}
