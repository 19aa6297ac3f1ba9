//! Pipeline orchestration: discovery, per-file processing and run metrics.

pub mod discovery;
mod file_processor;
mod metrics;
mod orchestrator;

#[cfg(test)]
mod orchestrator_integration_tests;

pub use discovery::{discover_images, object_key, ImageFile};
pub use file_processor::{FileFailure, FileProcessor, FileReport, FileStage, Step};
pub use metrics::{Metrics, MetricsSnapshot};
pub use orchestrator::{FailedFile, Orchestrator, OrchestratorConfig, RunStats};
