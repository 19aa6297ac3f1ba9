//! Label detection for uploaded images.
//!
//! Provides a `LabelService` trait with one production implementation:
//! - **Rekognition**: `DetectLabels` against an object already in the bucket
//!
//! `Labeler` sits on top of a service and reduces each raw label to the
//! [`Label`] name/confidence pair.

mod rekognition;

pub use rekognition::RekognitionService;

use crate::config::LabelingConfig;
use crate::model::Label;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Request policy sent with every detection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPolicy {
    /// Maximum number of labels returned
    pub max_labels: i32,

    /// Minimum confidence (percent) of a returned label
    pub min_confidence: f32,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            max_labels: 10,
            min_confidence: 75.0,
        }
    }
}

impl From<&LabelingConfig> for LabelPolicy {
    fn from(config: &LabelingConfig) -> Self {
        Self {
            max_labels: config.max_labels,
            min_confidence: config.min_confidence,
        }
    }
}

/// A label as returned by the service, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedLabel {
    pub name: Option<String>,
    pub confidence: Option<f32>,
    pub parents: Vec<String>,
    pub categories: Vec<String>,
    pub aliases: Vec<String>,
    pub instance_count: usize,
}

/// Abstraction over label detection providers.
#[async_trait]
pub trait LabelService: Send + Sync {
    /// Detect labels for `key` in `bucket`, honouring `policy`.
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        policy: &LabelPolicy,
    ) -> Result<Vec<DetectedLabel>>;

    /// Service name for logging.
    fn name(&self) -> &str;
}

/// Requests labels for objects in one bucket with a fixed policy.
pub struct Labeler {
    service: Arc<dyn LabelService>,
    bucket: String,
    policy: LabelPolicy,
}

impl Labeler {
    pub fn new(service: Arc<dyn LabelService>, bucket: impl Into<String>, policy: LabelPolicy) -> Self {
        Self {
            service,
            bucket: bucket.into(),
            policy,
        }
    }

    /// Detect and normalize labels for an uploaded object.
    ///
    /// No qualifying labels yields an empty vector.
    pub async fn labels_for(&self, key: &str) -> Result<Vec<Label>> {
        tracing::debug!(
            "Requesting labels for s3://{}/{} from {} (max {}, min confidence {})",
            self.bucket,
            key,
            self.service.name(),
            self.policy.max_labels,
            self.policy.min_confidence
        );

        let detected = self
            .service
            .detect_labels(&self.bucket, key, &self.policy)
            .await?;

        let labels = normalize_labels(key, detected)?;
        tracing::info!("Detected {} labels for {}", labels.len(), key);
        Ok(labels)
    }
}

/// Keep only name and rounded confidence, in service order.
///
/// A label without a name or confidence means the response is malformed.
pub fn normalize_labels(key: &str, detected: Vec<DetectedLabel>) -> Result<Vec<Label>> {
    detected
        .into_iter()
        .enumerate()
        .map(|(i, raw)| -> Result<Label> {
            let name = raw
                .name
                .ok_or_else(|| anyhow::anyhow!("Malformed label response for {}: label {} has no name", key, i))?;
            let confidence = raw.confidence.ok_or_else(|| {
                anyhow::anyhow!("Malformed label response for {}: label '{}' has no confidence", key, name)
            })?;
            Ok(Label::new(name, f64::from(confidence)))
        })
        .collect()
}
