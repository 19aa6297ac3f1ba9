//! Per-file processing: upload, then label, then record.
//!
//! Each file moves through `Pending -> Uploaded -> Labeled -> Recorded` with
//! no way back. A failure leaves the file at the last stage it reached; an
//! object uploaded before a later step failed stays in the bucket.

use crate::io::Uploader;
use crate::labeling::Labeler;
use crate::pipeline::discovery::ImageFile;
use crate::pipeline::Metrics;
use crate::table::Recorder;
use std::sync::Arc;
use std::time::Instant;

/// The remote call that failed for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Label,
    Record,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Upload => "upload",
            Step::Label => "label",
            Step::Record => "record",
        };
        f.write_str(name)
    }
}

/// Progress of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileStage {
    Pending,
    Uploaded,
    Labeled,
    Recorded,
}

impl FileStage {
    /// The step that moves a file out of this stage.
    pub fn next_step(self) -> Option<Step> {
        match self {
            FileStage::Pending => Some(Step::Upload),
            FileStage::Uploaded => Some(Step::Label),
            FileStage::Labeled => Some(Step::Record),
            FileStage::Recorded => None,
        }
    }
}

/// Outcome of a fully processed file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub key: String,
    pub bytes_uploaded: u64,
    pub labels: usize,
}

/// A file that stopped at `stage` because `step` failed.
#[derive(Debug)]
pub struct FileFailure {
    pub file_name: String,
    pub key: String,
    pub stage: FileStage,
    pub step: Step,
    pub error: anyhow::Error,
}

impl FileFailure {
    fn at(image: &ImageFile, key: &str, stage: FileStage, error: anyhow::Error) -> Self {
        Self {
            file_name: image.file_name.clone(),
            key: key.to_string(),
            stage,
            // Recorded files cannot fail
            step: stage.next_step().unwrap_or(Step::Record),
            error,
        }
    }

    /// Convert into an error naming the file and the failed step.
    pub fn into_error(self) -> anyhow::Error {
        let context = format!("{} step failed for {}", self.step, self.file_name);
        self.error.context(context)
    }
}

/// Runs the three steps for one file at a time.
pub struct FileProcessor {
    uploader: Uploader,
    labeler: Labeler,
    recorder: Recorder,
    metrics: Arc<Metrics>,
}

impl FileProcessor {
    pub fn new(uploader: Uploader, labeler: Labeler, recorder: Recorder, metrics: Arc<Metrics>) -> Self {
        Self {
            uploader,
            labeler,
            recorder,
            metrics,
        }
    }

    /// Upload `image` under `key`, label it and record the labels.
    pub async fn process_file(&self, image: &ImageFile, key: &str) -> Result<FileReport, FileFailure> {
        let mut stage = FileStage::Pending;

        let upload_start = Instant::now();
        let bytes_uploaded = self
            .uploader
            .upload(&image.path, key)
            .await
            .map_err(|e| FileFailure::at(image, key, stage, e))?;
        self.metrics.add_upload_time(upload_start.elapsed());
        self.metrics.add_bytes_uploaded(bytes_uploaded);
        stage = FileStage::Uploaded;

        let label_start = Instant::now();
        let labels = self
            .labeler
            .labels_for(key)
            .await
            .map_err(|e| FileFailure::at(image, key, stage, e))?;
        self.metrics.add_label_time(label_start.elapsed());
        stage = FileStage::Labeled;

        let label_count = labels.len();
        let record_start = Instant::now();
        self.recorder
            .record(key, labels)
            .await
            .map_err(|e| FileFailure::at(image, key, stage, e))?;
        self.metrics.add_record_time(record_start.elapsed());
        self.metrics.add_labels_recorded(label_count as u64);

        Ok(FileReport {
            file_name: image.file_name.clone(),
            key: key.to_string(),
            bytes_uploaded,
            labels: label_count,
        })
    }
}
