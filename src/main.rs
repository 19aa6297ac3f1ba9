//! Image Labeler CLI
//!
//! Uploads images to S3, labels them with Rekognition and records the labels in DynamoDB.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use image_labeler::pipeline::{discover_images, object_key};
use image_labeler::{build_runtime, run_pipeline, Config, ErrorPolicy};

#[derive(Parser)]
#[command(name = "image-labeler")]
#[command(about = "Upload images to S3, label them with Rekognition and record the labels in DynamoDB", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the image directory
    #[arg(long, global = true)]
    images_dir: Option<PathBuf>,

    /// Keep going when a file fails instead of stopping the run
    #[arg(long, global = true)]
    continue_on_error: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload, label and record every image (default if no command specified)
    Run,

    /// List the images that would be processed and their object keys
    Scan,

    /// Validate configuration
    Validate,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "image-labeler.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        None | Some(Commands::Run) => {
            let config = load_config(&cli)?;
            run_command(config)?;
        }

        Some(Commands::Scan) => {
            let config = load_config(&cli)?;
            scan_command(&config)?;
        }

        Some(Commands::Validate) => {
            let config = load_config(&cli)?;
            config.validate()?;
            println!("Configuration is valid");
        }

        Some(Commands::GenerateConfig { output }) => {
            generate_config_command(output.clone())?;
        }
    }

    Ok(())
}

/// Load the config file and environment, then apply CLI overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(dir) = &cli.images_dir {
        config.input.image_dir = dir.clone();
    }
    if cli.continue_on_error {
        config.run.on_error = ErrorPolicy::Continue;
    }

    Ok(config)
}

fn run_command(config: Config) -> Result<()> {
    let runtime = build_runtime()?;
    let stats = runtime.block_on(run_pipeline(config))?;

    for failure in &stats.failures {
        eprintln!("FAILED {} ({} step): {}", failure.file_name, failure.step, failure.message);
    }
    if stats.has_failures() {
        anyhow::bail!("{} of {} files failed", stats.files_failed, stats.files_found);
    }

    Ok(())
}

fn scan_command(config: &Config) -> Result<()> {
    config.validate_input()?;

    let images = discover_images(&config.input.image_dir, &config.input.extensions, config.input.sort)?;

    println!("\n=== Scan: {} ===", config.input.image_dir.display());
    for image in &images {
        println!(
            "{} -> {}",
            image.path.display(),
            object_key(&config.storage.key_prefix, &image.file_name)
        );
    }
    println!("{} files found", images.len());

    Ok(())
}

fn generate_config_command(output: PathBuf) -> Result<()> {
    let yaml = r#"# Image Labeler Configuration
#
# Environment variables override the values below:
#   S3_BUCKET        -> storage.bucket
#   DYNAMODB_TABLE   -> table.name
#   BRANCH_NAME      -> run.branch (falls back to GITHUB_REF_NAME)

# === INPUT: Which local files to process ===
input:
  # Directory scanned for images (not recursive)
  image_dir: "images"

  # Case-sensitive filename suffixes
  extensions: [".jpg", ".png"]

  # Process files in filename order (false = directory-listing order)
  sort: true

# === STORAGE: Where images are uploaded ===
storage:
  # bucket: "my-image-bucket"

  # Object key = <key_prefix>/<filename>
  key_prefix: "rekognition-input"

# === LABELING: Rekognition DetectLabels request policy ===
labeling:
  max_labels: 10
  min_confidence: 75.0

# === TABLE: Where labels are recorded ===
# table:
#   name: "image-labels"

# === RUN ===
run:
  # Branch stored with every record
  # branch: "main"

  # stop = abort at the first failing file, continue = log it and go on
  on_error: stop

  # Optional path to save metrics JSON after the run
  # metrics_output_path: "metrics.json"

# === AWS: Optional overrides of the standard AWS chain ===
# aws:
#   region: "us-east-1"
#
#   # Custom endpoint (for LocalStack etc.)
#   endpoint_url: "http://localhost:4566"
"#;

    std::fs::write(&output, yaml)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}
