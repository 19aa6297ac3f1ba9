//! Client construction for the bucket and the AWS service SDKs.
//!
//! Credentials and region are loaded from the standard AWS chain:
//! - Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION)
//! - AWS config files (~/.aws/credentials, ~/.aws/config)
//! - Instance or container credentials
//!
//! `aws.region` and `aws.endpoint_url` override the chain for all three services.

use crate::config::AwsConfig;
use anyhow::Result;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use std::sync::Arc;

/// Create an authenticated S3 store for the destination bucket.
pub fn create_bucket_store(bucket: &str, aws: &AwsConfig) -> Result<Arc<dyn ObjectStore>> {
    tracing::info!("Creating S3 client for bucket: {}", bucket);

    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

    if let Some(region) = &aws.region {
        builder = builder.with_region(region);
    }
    if let Some(endpoint) = &aws.endpoint_url {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"))
            .with_virtual_hosted_style_request(false);
    }

    Ok(Arc::new(builder.build()?))
}

/// Load the shared SDK configuration used by the Rekognition and DynamoDB clients.
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &aws.endpoint_url {
        tracing::info!("Using custom AWS endpoint: {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}
