//! Metrics module
//!
//! Prometheus counters and histograms for upload outcomes.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, register_histogram_vec, Counter,
    CounterVec, Encoder, Histogram, HistogramVec, TextEncoder,
};

lazy_static! {
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "resource_uploads_total",
        "Total number of uploads",
        &["mode", "status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "resource_upload_bytes_total",
        "Total bytes uploaded"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "resource_upload_duration_seconds",
        "Upload duration in seconds",
        &["mode"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]
    ).unwrap();

    pub static ref UPLOAD_PARTS: Histogram = register_histogram!(
        "resource_upload_parts",
        "Number of parts per chunked upload",
        vec![2.0, 5.0, 10.0, 50.0, 100.0, 200.0]
    ).unwrap();

    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "resource_upload_errors_total",
        "Total upload errors",
        &["kind"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(mode: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[mode, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload
pub fn record_upload_failure(mode: &str) {
    UPLOADS_TOTAL.with_label_values(&[mode, "failure"]).inc();
}

/// Record upload duration
pub fn record_upload_duration(mode: &str, duration_secs: f64) {
    UPLOAD_DURATION.with_label_values(&[mode]).observe(duration_secs);
}

/// Record the part count of a committed chunked upload
pub fn record_parts(parts_count: usize) {
    UPLOAD_PARTS.observe(parts_count as f64);
}

/// Record an error
pub fn record_error(kind: &str) {
    ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

/// Render the default registry in Prometheus text format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_upload_success() {
        record_upload_success("direct", 1024);
        assert!(UPLOADS_TOTAL.with_label_values(&["direct", "success"]).get() >= 1.0);
    }

    #[test]
    fn test_record_upload_failure() {
        record_upload_failure("chunked");
        record_error("network");
        assert!(ERRORS_TOTAL.with_label_values(&["network"]).get() >= 1.0);
    }

    #[test]
    fn test_gather_text_contains_metrics() {
        record_parts(3);
        record_upload_duration("chunked", 1.5);
        let text = gather_text();
        assert!(text.contains("resource_upload_parts"));
        assert!(text.contains("resource_upload_duration_seconds"));
    }
}
