//! Sequential file loop over the image directory.
//!
//! Files are processed one at a time; every remote call for a file completes
//! before the next call starts.

use crate::config::{Config, ErrorPolicy};
use crate::pipeline::discovery::{discover_images, object_key};
use crate::pipeline::{FileProcessor, Metrics, Step};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory scanned for images
    pub image_dir: PathBuf,

    /// Case-sensitive filename suffixes to select
    pub extensions: Vec<String>,

    /// Sort candidates by filename
    pub sort: bool,

    /// Prefix of every object key
    pub key_prefix: String,

    /// Behaviour when a file fails
    pub on_error: ErrorPolicy,

    /// Optional path to save metrics JSON after the run completes
    pub metrics_output_path: Option<String>,
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            image_dir: config.input.image_dir.clone(),
            extensions: config.input.extensions.clone(),
            sort: config.input.sort,
            key_prefix: config.storage.key_prefix.clone(),
            on_error: config.run.on_error,
            metrics_output_path: config.run.metrics_output_path.clone(),
        }
    }
}

/// Drives discovery and the per-file pipeline.
pub struct Orchestrator {
    processor: FileProcessor,
    metrics: Arc<Metrics>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(processor: FileProcessor, metrics: Arc<Metrics>, config: OrchestratorConfig) -> Self {
        Self {
            processor,
            metrics,
            config,
        }
    }

    /// Process every candidate image.
    ///
    /// Under [`ErrorPolicy::Stop`] the first failure is returned as the error.
    /// Under [`ErrorPolicy::Continue`] failures are collected in the stats.
    pub async fn run(&self) -> Result<RunStats> {
        let images = discover_images(&self.config.image_dir, &self.config.extensions, self.config.sort)?;

        let mut stats = RunStats {
            files_found: images.len(),
            ..Default::default()
        };
        self.metrics.set_files_found(images.len() as u64);

        tracing::info!(
            "Found {} image files in {}",
            images.len(),
            self.config.image_dir.display()
        );

        for (i, image) in images.iter().enumerate() {
            let key = object_key(&self.config.key_prefix, &image.file_name);
            tracing::info!("[{}/{}] Processing {}", i + 1, images.len(), image.file_name);

            match self.processor.process_file(image, &key).await {
                Ok(report) => {
                    self.metrics.add_file_processed();
                    stats.files_processed += 1;
                    tracing::info!(
                        "[{}/{}] Done {} -> {} ({} labels)",
                        i + 1,
                        images.len(),
                        report.file_name,
                        report.key,
                        report.labels
                    );
                }
                Err(failure) => {
                    self.metrics.add_file_failed();
                    stats.files_failed += 1;

                    if self.config.on_error == ErrorPolicy::Stop {
                        self.finish();
                        return Err(failure.into_error());
                    }

                    tracing::warn!(
                        "{} step failed for {}, continuing: {:#}",
                        failure.step,
                        failure.file_name,
                        failure.error
                    );
                    stats.failures.push(FailedFile {
                        file_name: failure.file_name,
                        key: failure.key,
                        step: failure.step,
                        message: format!("{:#}", failure.error),
                    });
                }
            }
        }

        self.finish();
        tracing::info!("Run complete: {}", stats);
        Ok(stats)
    }

    fn finish(&self) {
        let snapshot = self.metrics.snapshot();
        tracing::info!("Metrics: {}", snapshot);

        if let Some(ref path) = self.config.metrics_output_path {
            if let Err(e) = snapshot.save_to_file(path) {
                tracing::warn!("Failed to save metrics to {}: {}", path, e);
            }
        }
    }
}

/// A file that failed under the continue policy.
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub file_name: String,
    pub key: String,
    pub step: Step,
    pub message: String,
}

/// Statistics from an orchestrator run.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Candidate files found
    pub files_found: usize,

    /// Files uploaded, labeled and recorded
    pub files_processed: usize,

    /// Files that failed
    pub files_failed: usize,

    /// Details of each failed file (continue policy only)
    pub failures: Vec<FailedFile>,
}

impl RunStats {
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Found: {}, Processed: {}, Failed: {}",
            self.files_found, self.files_processed, self.files_failed
        )
    }
}
