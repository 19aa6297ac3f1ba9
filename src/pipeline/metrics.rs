//! Run counters and per-step timings.

use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Metrics for one pipeline run.
#[derive(Debug)]
pub struct Metrics {
    /// Candidate files found in the image directory
    pub files_found: AtomicU64,

    /// Files that went through all three steps
    pub files_processed: AtomicU64,

    /// Files that failed at some step
    pub files_failed: AtomicU64,

    /// Total bytes uploaded to the bucket
    pub bytes_uploaded: AtomicU64,

    /// Total labels recorded
    pub labels_recorded: AtomicU64,

    start_time: Instant,

    // Per-step timing (in microseconds for precision)
    /// Time spent uploading (microseconds)
    pub upload_us: AtomicU64,

    /// Time spent waiting on label detection (microseconds)
    pub label_us: AtomicU64,

    /// Time spent writing records (microseconds)
    pub record_us: AtomicU64,
}

impl Metrics {
    /// Create new metrics.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            files_found: AtomicU64::new(0),
            files_processed: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            bytes_uploaded: AtomicU64::new(0),
            labels_recorded: AtomicU64::new(0),
            start_time: Instant::now(),
            upload_us: AtomicU64::new(0),
            label_us: AtomicU64::new(0),
            record_us: AtomicU64::new(0),
        })
    }

    pub fn set_files_found(&self, count: u64) {
        self.files_found.store(count, Ordering::Relaxed);
    }

    pub fn add_file_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_uploaded(&self, bytes: u64) {
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn add_labels_recorded(&self, count: u64) {
        self.labels_recorded.fetch_add(count, Ordering::Relaxed);
    }

    /// Record time spent uploading.
    pub fn add_upload_time(&self, duration: Duration) {
        self.upload_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record time spent on label detection.
    pub fn add_label_time(&self, duration: Duration) {
        self.label_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record time spent writing records.
    pub fn add_record_time(&self, duration: Duration) {
        self.record_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_found: self.files_found.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            labels_recorded: self.labels_recorded.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            upload_secs: self.upload_us.load(Ordering::Relaxed) as f64 / 1_000_000.0,
            label_secs: self.label_us.load(Ordering::Relaxed) as f64 / 1_000_000.0,
            record_secs: self.record_us.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub files_found: u64,
    pub files_processed: u64,
    pub files_failed: u64,
    pub bytes_uploaded: u64,
    pub labels_recorded: u64,
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
    /// Total time spent uploading (seconds)
    pub upload_secs: f64,
    /// Total time spent on label detection (seconds)
    pub label_secs: f64,
    /// Total time spent writing records (seconds)
    pub record_secs: f64,
}

impl MetricsSnapshot {
    /// Save metrics to a JSON file.
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Metrics saved to {}", path);
        Ok(())
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} found, {} processed, {} failed, {} labels, {:.1} KB uploaded in {:.1}s \
             (upload {:.2}s, label {:.2}s, record {:.2}s)",
            self.files_found,
            self.files_processed,
            self.files_failed,
            self.labels_recorded,
            self.bytes_uploaded as f64 / 1024.0,
            self.elapsed.as_secs_f64(),
            self.upload_secs,
            self.label_secs,
            self.record_secs
        )
    }
}
