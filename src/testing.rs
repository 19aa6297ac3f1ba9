//! In-memory stand-ins for the label service and the record table.

use crate::labeling::{DetectedLabel, LabelPolicy, LabelService};
use crate::model::AnalysisRecord;
use crate::table::RecordTable;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Label service returning canned responses per key. Unknown keys get no labels.
#[derive(Default)]
pub struct FakeLabelService {
    responses: Mutex<HashMap<String, Vec<DetectedLabel>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, String, LabelPolicy)>>,
}

impl FakeLabelService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, key: &str, labels: Vec<DetectedLabel>) {
        self.responses.lock().unwrap().insert(key.to_string(), labels);
    }

    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// (bucket, key, policy) for every call, in order.
    pub fn calls(&self) -> Vec<(String, String, LabelPolicy)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelService for FakeLabelService {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        policy: &LabelPolicy,
    ) -> Result<Vec<DetectedLabel>> {
        self.calls
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), *policy));

        if self.failing.lock().unwrap().contains(key) {
            anyhow::bail!("InvalidS3ObjectException: unable to get object {}", key);
        }
        Ok(self.responses.lock().unwrap().get(key).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Record table holding the latest record per filename.
#[derive(Default)]
pub struct InMemoryTable {
    items: Mutex<BTreeMap<String, AnalysisRecord>>,
    failing: Mutex<HashSet<String>>,
    writes: Mutex<Vec<String>>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, filename: &str) {
        self.failing.lock().unwrap().insert(filename.to_string());
    }

    pub fn get(&self, filename: &str) -> Option<AnalysisRecord> {
        self.items.lock().unwrap().get(filename).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Filenames of successful writes, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordTable for InMemoryTable {
    async fn put_record(&self, record: &AnalysisRecord) -> Result<()> {
        if self.failing.lock().unwrap().contains(&record.filename) {
            anyhow::bail!("ProvisionedThroughputExceededException for {}", record.filename);
        }
        self.items
            .lock()
            .unwrap()
            .insert(record.filename.clone(), record.clone());
        self.writes.lock().unwrap().push(record.filename.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
