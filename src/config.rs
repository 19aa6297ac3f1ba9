//! Configuration for the image labeling pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the destination bucket.
pub const BUCKET_ENV: &str = "S3_BUCKET";

/// Environment variable holding the results table.
pub const TABLE_ENV: &str = "DYNAMODB_TABLE";

/// Environment variables checked, in order, for the CI branch name.
pub const BRANCH_ENVS: [&str; 2] = ["BRANCH_NAME", "GITHUB_REF_NAME"];

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Local image discovery
    #[serde(default)]
    pub input: InputConfig,

    /// Destination bucket and key layout
    #[serde(default)]
    pub storage: StorageConfig,

    /// Label detection request policy
    #[serde(default)]
    pub labeling: LabelingConfig,

    /// Results table
    #[serde(default)]
    pub table: TableConfig,

    /// Run behaviour
    #[serde(default)]
    pub run: RunConfig,

    /// AWS connection overrides
    #[serde(default)]
    pub aws: AwsConfig,
}

/// Local image discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory scanned (non-recursively) for images
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Case-sensitive filename suffixes selected for processing
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Sort candidates by filename instead of using directory-listing order
    #[serde(default = "default_true")]
    pub sort: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            extensions: default_extensions(),
            sort: true,
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Destination S3 bucket (falls back to `S3_BUCKET`)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Path segment prepended to every filename to form the object key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            key_prefix: default_key_prefix(),
        }
    }
}

/// Label detection request policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingConfig {
    /// Maximum number of labels returned per image
    #[serde(default = "default_max_labels")]
    pub max_labels: i32,

    /// Minimum confidence (percent) for a label to be returned
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            max_labels: default_max_labels(),
            min_confidence: default_min_confidence(),
        }
    }
}

/// Results table configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// DynamoDB table name (falls back to `DYNAMODB_TABLE`)
    #[serde(default)]
    pub name: Option<String>,
}

/// What the orchestrator does when a file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the run at the first failing file
    #[default]
    Stop,
    /// Log the failure and move on to the next file
    Continue,
}

/// Run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Branch stored with each record (falls back to `BRANCH_NAME`, then `GITHUB_REF_NAME`)
    #[serde(default)]
    pub branch: Option<String>,

    /// Behaviour when a file fails
    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Optional path to save metrics JSON after the run completes
    #[serde(default)]
    pub metrics_output_path: Option<String>,
}

/// AWS connection overrides. Unset values come from the standard AWS chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for all three services (LocalStack etc.)
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)?,
            // YAML is a superset of JSON
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(bucket) = get(BUCKET_ENV) {
            self.storage.bucket = Some(bucket);
        }
        if let Some(table) = get(TABLE_ENV) {
            self.table.name = Some(table);
        }
        if let Some(branch) = BRANCH_ENVS.iter().find_map(|name| get(*name)) {
            self.run.branch = Some(branch);
        }
    }

    /// Destination bucket. Call `validate()` first.
    pub fn bucket(&self) -> &str {
        self.storage.bucket.as_deref().unwrap_or("")
    }

    /// Results table name. Call `validate()` first.
    pub fn table_name(&self) -> &str {
        self.table.name.as_deref().unwrap_or("")
    }

    /// Check only what local discovery needs.
    pub fn validate_input(&self) -> anyhow::Result<()> {
        if self.input.extensions.is_empty() {
            anyhow::bail!("At least one image extension must be configured");
        }
        if let Some(ext) = self.input.extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            anyhow::bail!("Image extension '{}' must look like '.jpg'", ext);
        }
        Ok(())
    }

    /// Validate the configuration for a full run.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_input()?;

        if self.storage.bucket.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("No destination bucket: set storage.bucket or {}", BUCKET_ENV);
        }
        if self.table.name.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("No results table: set table.name or {}", TABLE_ENV);
        }
        if self.labeling.max_labels < 1 {
            anyhow::bail!("max_labels must be >= 1");
        }
        if !(0.0..=100.0).contains(&self.labeling.min_confidence) {
            anyhow::bail!("min_confidence must be between 0 and 100");
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_image_dir() -> PathBuf { PathBuf::from("images") }
fn default_extensions() -> Vec<String> { vec![".jpg".to_string(), ".png".to_string()] }
fn default_true() -> bool { true }
fn default_key_prefix() -> String { "rekognition-input".to_string() }
fn default_max_labels() -> i32 { 10 }
fn default_min_confidence() -> f32 { 75.0 }
