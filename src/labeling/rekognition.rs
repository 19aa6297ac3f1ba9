//! Rekognition `DetectLabels` backend.

use super::{DetectedLabel, LabelPolicy, LabelService};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rekognition::types::{Image, Label as RekognitionLabel, S3Object};
use aws_sdk_rekognition::Client;

/// Label service backed by Amazon Rekognition.
pub struct RekognitionService {
    client: Client,
}

impl RekognitionService {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl LabelService for RekognitionService {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        policy: &LabelPolicy,
    ) -> Result<Vec<DetectedLabel>> {
        let image = Image::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let response = self
            .client
            .detect_labels()
            .image(image)
            .max_labels(policy.max_labels)
            .min_confidence(policy.min_confidence)
            .send()
            .await
            .with_context(|| format!("DetectLabels failed for s3://{}/{}", bucket, key))?;

        Ok(response.labels().iter().map(to_detected).collect())
    }

    fn name(&self) -> &str {
        "rekognition"
    }
}

fn to_detected(label: &RekognitionLabel) -> DetectedLabel {
    DetectedLabel {
        name: label.name().map(str::to_string),
        confidence: label.confidence(),
        parents: label
            .parents()
            .iter()
            .filter_map(|p| p.name().map(str::to_string))
            .collect(),
        categories: label
            .categories()
            .iter()
            .filter_map(|c| c.name().map(str::to_string))
            .collect(),
        aliases: label
            .aliases()
            .iter()
            .filter_map(|a| a.name().map(str::to_string))
            .collect(),
        instance_count: label.instances().len(),
    }
}
