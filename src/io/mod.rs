//! Bucket access: client construction and uploads.

mod store;
mod uploader;

pub use store::{create_bucket_store, load_sdk_config};
pub use uploader::Uploader;
