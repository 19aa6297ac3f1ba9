//! End-to-end orchestrator tests against in-memory collaborators.
//!
//! Tests cover:
//! 1. A single image flowing through upload, label and record
//! 2. Empty directories and non-matching files
//! 3. Stop and continue error policies
//! 4. Re-running over the same directory

use crate::config::ErrorPolicy;
use crate::io::Uploader;
use crate::labeling::{DetectedLabel, LabelPolicy, Labeler};
use crate::model::{Label, TIMESTAMP_FORMAT};
use crate::pipeline::{FileProcessor, Metrics, Orchestrator, OrchestratorConfig, Step};
use crate::table::Recorder;
use crate::testing::{FakeLabelService, InMemoryTable};
use chrono::NaiveDateTime;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct TestRun {
    _root: TempDir,
    image_dir: PathBuf,
    store: Arc<InMemory>,
    labels: Arc<FakeLabelService>,
    table: Arc<InMemoryTable>,
}

impl TestRun {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let image_dir = root.path().join("images");
        std::fs::create_dir_all(&image_dir).unwrap();

        Self {
            _root: root,
            image_dir,
            store: Arc::new(InMemory::new()),
            labels: Arc::new(FakeLabelService::new()),
            table: Arc::new(InMemoryTable::new()),
        }
    }

    fn add_image(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.image_dir.join(name), contents).unwrap();
    }

    fn orchestrator(&self, on_error: ErrorPolicy) -> Orchestrator {
        let metrics = Metrics::new();
        let processor = FileProcessor::new(
            Uploader::new(self.store.clone(), "image-bucket"),
            Labeler::new(self.labels.clone(), "image-bucket", LabelPolicy::default()),
            Recorder::new(self.table.clone(), Some("main".to_string())),
            metrics.clone(),
        );
        let config = OrchestratorConfig {
            image_dir: self.image_dir.clone(),
            extensions: vec![".jpg".to_string(), ".png".to_string()],
            sort: true,
            key_prefix: "rekognition-input".to_string(),
            on_error,
            metrics_output_path: None,
        };
        Orchestrator::new(processor, metrics, config)
    }

    async fn uploaded_keys(&self) -> Vec<String> {
        let listing = self
            .store
            .list_with_delimiter(Some(&ObjectPath::from("rekognition-input")))
            .await
            .unwrap();
        let mut keys: Vec<String> = listing.objects.into_iter().map(|o| o.location.to_string()).collect();
        keys.sort();
        keys
    }

    async fn uploaded_bytes(&self, key: &str) -> Vec<u8> {
        self.store
            .get(&ObjectPath::from(key))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap()
            .to_vec()
    }
}

fn detected(name: &str, confidence: f32) -> DetectedLabel {
    DetectedLabel {
        name: Some(name.to_string()),
        confidence: Some(confidence),
        parents: vec!["Animal".to_string()],
        ..Default::default()
    }
}

/// Test 1: cat.jpg goes through all three steps with the expected key
#[tokio::test]
async fn test_single_image_end_to_end() {
    let run = TestRun::new();
    run.add_image("cat.jpg", b"cat-bytes");
    run.labels
        .set_response("rekognition-input/cat.jpg", vec![detected("Cat", 98.42)]);

    let stats = run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();
    assert_eq!(stats.files_found, 1);
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.files_failed, 0);

    // Upload: local bytes land under the prefixed key
    assert_eq!(run.uploaded_keys().await, vec!["rekognition-input/cat.jpg"]);
    assert_eq!(run.uploaded_bytes("rekognition-input/cat.jpg").await, b"cat-bytes");

    // Label: called once with the same key in the configured bucket
    let calls = run.labels.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "image-bucket");
    assert_eq!(calls[0].1, "rekognition-input/cat.jpg");
    assert_eq!(calls[0].2, LabelPolicy { max_labels: 10, min_confidence: 75.0 });

    // Record: labels, branch and a current timestamp under the object key
    let record = run.table.get("rekognition-input/cat.jpg").unwrap();
    assert_eq!(record.filename, "rekognition-input/cat.jpg");
    assert_eq!(record.labels, vec![Label::new("Cat", 98.42)]);
    assert_eq!(record.branch.as_deref(), Some("main"));
    assert!(NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
}

/// Test 2: empty directory performs no calls
#[tokio::test]
async fn test_empty_directory() {
    let run = TestRun::new();

    let stats = run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();
    assert_eq!(stats.files_found, 0);
    assert_eq!(stats.files_processed, 0);

    assert!(run.uploaded_keys().await.is_empty());
    assert!(run.labels.calls().is_empty());
    assert_eq!(run.table.len(), 0);
}

/// Test 3: only lowercase .jpg/.png files are selected
#[tokio::test]
async fn test_non_matching_files_are_ignored() {
    let run = TestRun::new();
    run.add_image("photo.PNG", b"upper");
    run.add_image("notes.txt", b"text");
    run.add_image("dog.png", b"dog");

    let stats = run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();
    assert_eq!(stats.files_found, 1);
    assert_eq!(run.uploaded_keys().await, vec!["rekognition-input/dog.png"]);
    assert_eq!(run.table.writes(), vec!["rekognition-input/dog.png"]);
}

/// Test 4: files are processed in filename order
#[tokio::test]
async fn test_processing_order_is_sorted() {
    let run = TestRun::new();
    for name in ["c.jpg", "a.png", "b.jpg"] {
        run.add_image(name, b"x");
    }

    run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();

    let labeled: Vec<String> = run.labels.calls().into_iter().map(|c| c.1).collect();
    assert_eq!(
        labeled,
        vec!["rekognition-input/a.png", "rekognition-input/b.jpg", "rekognition-input/c.jpg"]
    );
    assert_eq!(run.table.writes(), labeled);
}

/// Test 5: image with no qualifying labels still gets a record
#[tokio::test]
async fn test_image_without_labels_is_recorded() {
    let run = TestRun::new();
    run.add_image("blank.png", b"blank");

    let stats = run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();
    assert_eq!(stats.files_processed, 1);
    assert!(run.table.get("rekognition-input/blank.png").unwrap().labels.is_empty());
}

/// Test 6: stop policy aborts at the first failing file
#[tokio::test]
async fn test_stop_policy_aborts_run() {
    let run = TestRun::new();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        run.add_image(name, b"x");
    }
    run.labels.fail_on("rekognition-input/b.jpg");

    let err = run.orchestrator(ErrorPolicy::Stop).run().await.unwrap_err();
    assert!(format!("{:#}", err).contains("label step failed for b.jpg"));

    // a.jpg completed, b.jpg uploaded but not recorded, c.jpg never touched
    assert_eq!(run.table.writes(), vec!["rekognition-input/a.jpg"]);
    assert_eq!(
        run.uploaded_keys().await,
        vec!["rekognition-input/a.jpg", "rekognition-input/b.jpg"]
    );
    assert_eq!(run.labels.calls().len(), 2);
}

/// Test 7: continue policy processes the remaining files and reports the failure
#[tokio::test]
async fn test_continue_policy_reports_failures() {
    let run = TestRun::new();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        run.add_image(name, b"x");
    }
    run.table.fail_on("rekognition-input/b.jpg");

    let stats = run.orchestrator(ErrorPolicy::Continue).run().await.unwrap();
    assert_eq!(stats.files_found, 3);
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_failed, 1);
    assert!(stats.has_failures());

    let failure = &stats.failures[0];
    assert_eq!(failure.file_name, "b.jpg");
    assert_eq!(failure.key, "rekognition-input/b.jpg");
    assert_eq!(failure.step, Step::Record);

    assert_eq!(
        run.table.writes(),
        vec!["rekognition-input/a.jpg", "rekognition-input/c.jpg"]
    );
}

/// Test 8: a second run overwrites the record for the same file
#[tokio::test]
async fn test_rerun_overwrites_record() {
    let run = TestRun::new();
    run.add_image("cat.jpg", b"v1");
    run.labels
        .set_response("rekognition-input/cat.jpg", vec![detected("Dog", 80.0)]);
    run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();

    run.add_image("cat.jpg", b"v2");
    run.labels
        .set_response("rekognition-input/cat.jpg", vec![detected("Cat", 99.1)]);
    run.orchestrator(ErrorPolicy::Stop).run().await.unwrap();

    assert_eq!(run.table.len(), 1);
    assert_eq!(
        run.table.get("rekognition-input/cat.jpg").unwrap().labels,
        vec![Label::new("Cat", 99.1)]
    );
    assert_eq!(run.uploaded_bytes("rekognition-input/cat.jpg").await, b"v2");
}
