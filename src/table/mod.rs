//! Persistence of analysis records.

mod dynamodb;

pub use dynamodb::{record_to_item, DynamoTable};

use crate::model::{AnalysisRecord, Label};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// A key-value table of records keyed by filename.
///
/// `put_record` replaces any existing record with the same filename.
#[async_trait]
pub trait RecordTable: Send + Sync {
    async fn put_record(&self, record: &AnalysisRecord) -> Result<()>;

    /// Table name for logging.
    fn name(&self) -> &str;
}

/// Stamps and stores one record per processed image.
pub struct Recorder {
    table: Arc<dyn RecordTable>,
    branch: Option<String>,
}

impl Recorder {
    pub fn new(table: Arc<dyn RecordTable>, branch: Option<String>) -> Self {
        Self { table, branch }
    }

    /// Write a record for `key` stamped with the current UTC time.
    pub async fn record(&self, key: &str, labels: Vec<Label>) -> Result<AnalysisRecord> {
        let record = AnalysisRecord::new(key, labels, self.branch.as_deref(), Utc::now());

        tracing::info!(
            "Recording {} labels for {} in {} (branch: {})",
            record.labels.len(),
            record.filename,
            self.table.name(),
            record.branch.as_deref().unwrap_or("-")
        );

        self.table.put_record(&record).await?;
        Ok(record)
    }
}
