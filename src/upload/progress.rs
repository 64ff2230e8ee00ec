//! Progress tracking
//!
//! Turns a stream of "N more bytes sent" events into percentage, throughput
//! and ETA. Throughput is resampled at most once per second; ETA uses the
//! cumulative average rate since the upload started.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Minimum time between throughput samples
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Estimated time remaining
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "seconds", rename_all = "snake_case")]
pub enum Eta {
    /// Not enough data yet to estimate
    Calculating,
    /// Always finite and non-negative
    Seconds(f64),
}

impl Eta {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Eta::Calculating => None,
            Eta::Seconds(s) => Some(*s),
        }
    }
}

/// Point-in-time view of an upload's progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    /// Clamped to [0, 100]
    pub percentage: f64,
    /// Rate over the last sample window
    pub bytes_per_second: f64,
    pub eta: Eta,
}

/// Running totals for one upload session
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_bytes: u64,
    bytes_transferred: u64,
    started_at: Instant,
    last_sample_at: Instant,
    bytes_at_last_sample: u64,
    bytes_per_second: f64,
}

impl ProgressTracker {
    /// Start tracking now
    pub fn new(total_bytes: u64) -> Self {
        Self::starting_at(total_bytes, Instant::now())
    }

    /// Start tracking from an explicit instant
    pub fn starting_at(total_bytes: u64, started_at: Instant) -> Self {
        Self {
            total_bytes,
            bytes_transferred: 0,
            started_at,
            last_sample_at: started_at,
            bytes_at_last_sample: 0,
            bytes_per_second: 0.0,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Record bytes that just finished transferring
    pub fn record(&mut self, bytes: u64) -> ProgressSnapshot {
        self.record_at(bytes, Instant::now())
    }

    /// Record bytes against an explicit clock reading
    pub fn record_at(&mut self, bytes: u64, now: Instant) -> ProgressSnapshot {
        self.bytes_transferred = self.bytes_transferred.saturating_add(bytes);

        let since_sample = now.saturating_duration_since(self.last_sample_at);
        if since_sample >= SAMPLE_INTERVAL {
            let delta = self.bytes_transferred - self.bytes_at_last_sample;
            self.bytes_per_second = delta as f64 / since_sample.as_secs_f64();
            self.last_sample_at = now;
            self.bytes_at_last_sample = self.bytes_transferred;
        }

        self.snapshot_at(now)
    }

    /// Current snapshot without recording anything
    pub fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_transferred: self.bytes_transferred,
            total_bytes: self.total_bytes,
            percentage: self.percentage(),
            bytes_per_second: self.bytes_per_second,
            eta: self.eta(now),
        }
    }

    fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        if self.bytes_transferred >= self.total_bytes {
            return 100.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0).clamp(0.0, 100.0)
    }

    fn eta(&self, now: Instant) -> Eta {
        if self.bytes_transferred >= self.total_bytes {
            return Eta::Seconds(0.0);
        }

        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        if elapsed <= 0.0 || self.bytes_transferred == 0 {
            return Eta::Calculating;
        }

        let average_rate = self.bytes_transferred as f64 / elapsed;
        let remaining = (self.total_bytes - self.bytes_transferred) as f64;
        let seconds = remaining / average_rate;
        if seconds.is_finite() && seconds >= 0.0 {
            Eta::Seconds(seconds)
        } else {
            Eta::Calculating
        }
    }
}
