//! Upload events and cancellation
//!
//! The orchestrator reports state changes and progress through
//! [`UploadObserver`]; any front end can subscribe. Cancellation is a shared
//! flag checked between network calls.

use super::{ProgressSnapshot, UploadError, UploadState};
use crate::api::Resource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives upload events. Every method defaults to a no-op.
pub trait UploadObserver: Send + Sync {
    fn on_state_change(&self, _state: UploadState) {}

    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}

    fn on_part_uploaded(&self, _part_number: u32, _total_parts: u32) {}

    /// Invoked once when the resource has been stored
    fn on_success(&self, _resource: &Resource) {}

    fn on_failure(&self, _error: &UploadError) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Reports every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl UploadObserver for LoggingObserver {
    fn on_state_change(&self, state: UploadState) {
        tracing::info!(state = %state, "Upload state changed");
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        tracing::info!(
            bytes = snapshot.bytes_transferred,
            total = snapshot.total_bytes,
            percentage = %format!("{:.1}", snapshot.percentage),
            bytes_per_second = snapshot.bytes_per_second as u64,
            eta_seconds = ?snapshot.eta.seconds().map(|s| s.round() as u64),
            "Upload progress"
        );
    }

    fn on_part_uploaded(&self, part_number: u32, total_parts: u32) {
        tracing::debug!(part_number, total_parts, "Part uploaded");
    }

    fn on_success(&self, resource: &Resource) {
        tracing::info!(
            resource_id = ?resource.id,
            title = ?resource.title,
            "Resource stored"
        );
    }

    fn on_failure(&self, error: &UploadError) {
        tracing::error!(error = %error, kind = error.kind(), "Upload failed");
    }
}

/// Cloneable cancellation flag shared between a front end and the orchestrator
#[derive(Debug, Default, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop issuing further requests. An in-flight request finishes but its
    /// result is discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
