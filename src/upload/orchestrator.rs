//! Upload orchestrator
//!
//! Drives one [`UploadSession`] from `idle` to `completed` or `failed`.
//!
//! # Flow
//!
//! Direct mode (file size <= part size):
//! 1. One request carrying the file and its metadata
//!
//! Chunked mode:
//! 1. Initiate, obtaining an upload id and object key
//! 2. Upload parts one at a time in ascending order, collecting descriptors
//! 3. Complete with the ordered descriptors
//!
//! Any failure fails the session; nothing is retried and no partial commit is
//! attempted. Parts already on the server are left for it to clean up.
//!
//! # Example
//!
//! ```no_run
//! use resource_uploadr::api::{ApiClientConfig, HttpResourceApi};
//! use resource_uploadr::upload::{
//!     CancelToken, LoggingObserver, ResourceType, UploadFile, UploadForm, UploadOrchestrator,
//!     UploadSettings,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpResourceApi::new(ApiClientConfig::new("http://localhost:3000"))?;
//! let orchestrator = UploadOrchestrator::new(api, UploadSettings::default());
//!
//! let mut form = UploadForm::new(orchestrator.validator(), ResourceType::Assignment);
//! form.select_file(UploadFile::open("week1.pdf").await?)?;
//! let meta = form.metadata_mut();
//! meta.batch_id = "7".into();
//! meta.batch_name = "rust-2024".into();
//! meta.uploader_id = "42".into();
//!
//! let mut session = form.submit()?;
//! let resource = orchestrator
//!     .run(&mut session, &LoggingObserver, &CancelToken::new())
//!     .await?;
//! println!("stored resource {:?}", resource.id);
//! # Ok(())
//! # }
//! ```

use super::{
    CancelToken, Chunker, CompletedParts, PartUploader, ProgressTracker, UploadError,
    UploadMode, UploadObserver, UploadSession, UploadSettings, UploadState, Validator,
    MIN_PART_SIZE,
};
use crate::api::{CompleteRequest, DirectUpload, InitiateRequest, Resource, ResourceApi};
use crate::metrics;
use std::time::Instant;

/// Sequences the upload protocol and owns the session state machine
pub struct UploadOrchestrator<A> {
    api: A,
    settings: UploadSettings,
}

impl<A: ResourceApi> UploadOrchestrator<A> {
    pub fn new(api: A, settings: UploadSettings) -> Self {
        Self { api, settings }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Validator for the configured size limit
    pub fn validator(&self) -> Validator {
        Validator::new(self.settings.max_file_size)
    }

    /// Run an idle session to completion.
    ///
    /// The file and metadata are re-checked first; a rejection leaves the
    /// session idle and makes no network calls. Once uploading, the session
    /// always ends `completed` or `failed`.
    #[tracing::instrument(
        name = "upload.run",
        skip_all,
        fields(
            session = %session.id(),
            file.name = %session.file().name(),
            upload.bytes = session.file().size(),
            upload.mode = %session.mode(self.settings.part_size),
            resource.kind = %session.resource_type()
        ),
        err
    )]
    pub async fn run(
        &self,
        session: &mut UploadSession,
        observer: &dyn UploadObserver,
        cancel: &CancelToken,
    ) -> Result<Resource, UploadError> {
        if session.state() != UploadState::Idle {
            return Err(UploadError::InvalidTransition {
                from: session.state(),
                to: UploadState::Uploading,
            });
        }
        self.validator()
            .validate(session.file(), session.resource_type())?;
        session.metadata().validate()?;

        session.transition(UploadState::Uploading)?;
        observer.on_state_change(UploadState::Uploading);

        let mode = session.mode(self.settings.part_size);
        let start_time = Instant::now();
        let result = match mode {
            UploadMode::Direct => self.upload_direct(session, observer, cancel).await,
            UploadMode::Chunked => self.upload_chunked(session, observer, cancel).await,
        };

        let duration = start_time.elapsed();
        metrics::record_upload_duration(mode.as_str(), duration.as_secs_f64());

        match result {
            Ok(resource) => {
                session.transition(UploadState::Completed)?;
                metrics::record_upload_success(mode.as_str(), session.file().size());

                tracing::info!(
                    resource_id = ?resource.id,
                    duration_ms = duration.as_millis(),
                    "Upload completed"
                );

                observer.on_state_change(UploadState::Completed);
                observer.on_success(&resource);
                Ok(resource)
            }
            Err(err) => {
                session.transition(UploadState::Failed)?;
                metrics::record_upload_failure(mode.as_str());
                metrics::record_error(err.kind());

                tracing::error!(
                    error = %err,
                    kind = err.kind(),
                    duration_ms = duration.as_millis(),
                    "Upload failed"
                );

                observer.on_state_change(UploadState::Failed);
                observer.on_failure(&err);
                Err(err)
            }
        }
    }

    async fn upload_direct(
        &self,
        session: &UploadSession,
        observer: &dyn UploadObserver,
        cancel: &CancelToken,
    ) -> Result<Resource, UploadError> {
        let file = session.file();
        let mut tracker = ProgressTracker::new(file.size());
        observer.on_progress(&tracker.snapshot_at(Instant::now()));

        ensure_not_cancelled(cancel)?;
        let bytes = file.read_all().await?;

        // Once the server has stored the resource a late cancel is ignored
        let resource = self
            .api
            .direct_upload(DirectUpload {
                file_name: file.name().to_string(),
                bytes,
                metadata: session.metadata().clone(),
                resource_type: session.resource_type(),
            })
            .await?;

        observer.on_progress(&tracker.record(file.size()));
        Ok(resource)
    }

    async fn upload_chunked(
        &self,
        session: &UploadSession,
        observer: &dyn UploadObserver,
        cancel: &CancelToken,
    ) -> Result<Resource, UploadError> {
        let file = session.file();
        let metadata = session.metadata();

        ensure_not_cancelled(cancel)?;
        let upload = self
            .api
            .initiate(InitiateRequest {
                batch_name: metadata.batch_name.clone(),
                resource_type: session.resource_type(),
                file_name: file.name().to_string(),
            })
            .await?;
        ensure_not_cancelled(cancel)?;

        let chunker = Chunker::new(file.size(), self.settings.part_size);
        let total_parts = chunker.part_count();
        let uploader = PartUploader::new(&self.api, file.name(), self.settings.part_timeout);
        let mut parts = CompletedParts::with_capacity(total_parts as usize);
        let mut tracker = ProgressTracker::new(file.size());
        observer.on_progress(&tracker.snapshot_at(Instant::now()));

        tracing::info!(
            upload_id = %upload.upload_id,
            key = %upload.key,
            total_parts,
            "Uploading parts"
        );

        for range in chunker {
            if let Err(err) = ensure_not_cancelled(cancel) {
                tracing::warn!(
                    upload_id = %upload.upload_id,
                    parts_uploaded = parts.len(),
                    "Cancelled; uploaded parts are left to the server"
                );
                return Err(err);
            }

            if range.len() < MIN_PART_SIZE && range.part_number < total_parts {
                tracing::warn!(
                    part_number = range.part_number,
                    size = range.len(),
                    "Part may be too small (< 5MB)"
                );
            }

            let bytes = file.read_range(&range).await?;
            let descriptor = uploader
                .upload(bytes, range.part_number, &upload.upload_id, &upload.key)
                .await
                .inspect_err(|err| {
                    tracing::warn!(
                        upload_id = %upload.upload_id,
                        part_number = range.part_number,
                        error = %err,
                        "Part upload failed; abandoning remaining parts"
                    );
                })?;

            // The request was allowed to finish; its result is discarded
            ensure_not_cancelled(cancel)?;

            parts.push(descriptor)?;
            tracing::debug!(
                upload_id = %upload.upload_id,
                part_number = range.part_number,
                bytes = range.len(),
                "Uploaded part"
            );
            observer.on_part_uploaded(range.part_number, total_parts);
            observer.on_progress(&tracker.record(range.len()));
        }

        ensure_not_cancelled(cancel)?;

        let parts_count = parts.len();
        let resource = self
            .api
            .complete(CompleteRequest {
                key: upload.key,
                upload_id: upload.upload_id,
                parts: parts.into_vec(),
                batch_id: metadata.batch_id.clone(),
                title: metadata.title.clone(),
                description: metadata.description.clone(),
                uploaded_by_id: metadata.uploader_id.clone(),
                resource_type: session.resource_type(),
            })
            .await?;

        metrics::record_parts(parts_count);
        Ok(resource)
    }
}

fn ensure_not_cancelled(cancel: &CancelToken) -> Result<(), UploadError> {
    if cancel.is_cancelled() {
        Err(UploadError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockResourceApi, PartDescriptor};
    use crate::upload::{NoopObserver, ResourceType, UploadFile, UploadMetadata};
    use bytes::Bytes;
    use serde_json::json;

    fn settings() -> UploadSettings {
        UploadSettings {
            part_size: 10,
            max_file_size: 1000,
            part_timeout: None,
        }
    }

    fn metadata() -> UploadMetadata {
        UploadMetadata {
            title: "Lecture".into(),
            description: String::new(),
            batch_id: "7".into(),
            batch_name: "rust-2024".into(),
            uploader_id: "42".into(),
        }
    }

    fn session(name: &str, size: usize) -> UploadSession {
        UploadSession::new(
            UploadFile::from_bytes(name, Bytes::from(vec![1u8; size])),
            ResourceType::Recording,
            metadata(),
        )
    }

    fn resource() -> Resource {
        serde_json::from_value(json!({"id": 1})).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_file_makes_no_calls() {
        // No expectations: any call panics
        let orchestrator = UploadOrchestrator::new(MockResourceApi::new(), settings());
        let mut session = session("slides.pdf", 5);

        let err = orchestrator
            .run(&mut session, &NoopObserver, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(_)));
        assert_eq!(session.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn test_terminal_session_cannot_rerun() {
        let mut api = MockResourceApi::new();
        api.expect_direct_upload()
            .times(1)
            .returning(|_| Ok(resource()));
        let orchestrator = UploadOrchestrator::new(api, settings());
        let mut session = session("clip.mp4", 10);

        orchestrator
            .run(&mut session, &NoopObserver, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(session.state(), UploadState::Completed);

        let err = orchestrator
            .run(&mut session, &NoopObserver, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cancel_before_start_fails_without_calls() {
        let orchestrator = UploadOrchestrator::new(MockResourceApi::new(), settings());
        let mut session = session("clip.mp4", 25);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = orchestrator
            .run(&mut session, &NoopObserver, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Cancelled));
        assert_eq!(session.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn test_initiate_failure_skips_parts() {
        let mut api = MockResourceApi::new();
        api.expect_initiate()
            .times(1)
            .returning(|_| Err(crate::api::ApiError::Rejected("batch not found".into())));
        api.expect_upload_part().never();
        api.expect_complete().never();

        let orchestrator = UploadOrchestrator::new(api, settings());
        let mut session = session("clip.mp4", 25);

        let err = orchestrator
            .run(&mut session, &NoopObserver, &CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "batch not found");
        assert_eq!(session.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn test_complete_receives_parts_in_order() {
        let mut api = MockResourceApi::new();
        api.expect_initiate().times(1).returning(|_| {
            Ok(crate::api::InitiatedUpload {
                key: "k".into(),
                upload_id: "u".into(),
            })
        });
        api.expect_upload_part().times(3).returning(|part| {
            Ok(PartDescriptor {
                part_number: part.part_number,
                body: json!({"PartNumber": part.part_number}),
            })
        });
        api.expect_complete()
            .withf(|req| {
                req.parts.iter().map(|p| p.part_number).collect::<Vec<_>>() == vec![1, 2, 3]
                    && req.uploaded_by_id == "42"
                    && req.key == "k"
            })
            .times(1)
            .returning(|_| Ok(resource()));

        let orchestrator = UploadOrchestrator::new(api, settings());
        let mut session = session("clip.mp4", 25);

        orchestrator
            .run(&mut session, &NoopObserver, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(session.state(), UploadState::Completed);
    }
}
