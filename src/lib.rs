//! Image Labeler
//!
//! Uploads local images to S3, labels them with Rekognition and records the
//! labels in DynamoDB. Built to run as a CI step.
//!
//! # Architecture
//!
//! - **I/O**: S3 uploads through `object_store`
//! - **Labeling**: `DetectLabels` behind the `LabelService` trait
//! - **Table**: `PutItem` behind the `RecordTable` trait
//! - **Pipeline**: directory discovery and the sequential per-file loop
//!
//! # Usage
//!
//! ```no_run
//! use image_labeler::{run_pipeline, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let runtime = image_labeler::build_runtime()?;
//!     let stats = runtime.block_on(run_pipeline(config))?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod io;
pub mod labeling;
pub mod model;
pub mod pipeline;
pub mod table;

#[cfg(test)]
mod testing;

pub use config::{Config, ErrorPolicy};
pub use io::Uploader;
pub use labeling::{LabelPolicy, LabelService, Labeler, RekognitionService};
pub use model::{AnalysisRecord, Label};
pub use pipeline::{FileProcessor, Metrics, Orchestrator, OrchestratorConfig, RunStats};
pub use table::{DynamoTable, RecordTable, Recorder};

use anyhow::Result;
use std::sync::Arc;

/// Run the full labeling pipeline with the given configuration.
pub async fn run_pipeline(config: Config) -> Result<RunStats> {
    config.validate()?;

    tracing::info!("Starting image labeling pipeline");
    tracing::info!(
        "Bucket: {}, table: {}, branch: {}",
        config.bucket(),
        config.table_name(),
        config.run.branch.as_deref().unwrap_or("-")
    );

    let store = io::create_bucket_store(config.bucket(), &config.aws)?;
    let sdk_config = io::load_sdk_config(&config.aws).await;

    let metrics = Metrics::new();

    let uploader = Uploader::new(store, config.bucket());
    let labeler = Labeler::new(
        Arc::new(RekognitionService::new(&sdk_config)),
        config.bucket(),
        LabelPolicy::from(&config.labeling),
    );
    let recorder = Recorder::new(
        Arc::new(DynamoTable::new(&sdk_config, config.table_name())),
        config.run.branch.clone(),
    );

    let processor = FileProcessor::new(uploader, labeler, recorder, metrics.clone());
    let orchestrator = Orchestrator::new(processor, metrics, OrchestratorConfig::from(&config));

    orchestrator.run().await
}

/// Build the single-threaded Tokio runtime the pipeline runs on.
pub fn build_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
