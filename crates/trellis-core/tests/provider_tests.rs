use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use trellis_core::{
    BufferedOutput, CancellationToken, DiscoveryProvider, ManifestDiscovery, OutputChannel,
    ProviderError, ResultsFileRunner, RunProvider, TestStatus, Tests, TestsToRun, TreeBuilder,
};

const MANIFEST: &str = r#"[
  {
    "name": "tests/test_math.py",
    "nameToRun": "tests/test_math.py",
    "functions": [{ "name": "test_add", "nameToRun": "tests/test_math.py::test_add" }],
    "suites": [
      {
        "name": "TestDivide",
        "nameToRun": "tests/test_math.py::TestDivide",
        "functions": [
          { "name": "test_by_one", "nameToRun": "tests/test_math.py::TestDivide::test_by_one" },
          { "name": "test_by_zero", "nameToRun": "tests/test_math.py::TestDivide::test_by_zero" }
        ]
      }
    ]
  },
  {
    "name": "tests/test_io.py",
    "nameToRun": "tests/test_io.py",
    "errorsWhenDiscovering": "ImportError: no module named fixtures"
  }
]"#;

const RESULTS: &str = r#"{
  "tests/test_math.py::test_add": { "passed": true, "time": 0.25 },
  "tests/test_math.py::TestDivide::test_by_one": { "passed": true, "time": 0.5, "status": "Skipped" },
  "tests/test_math.py::TestDivide::test_by_zero": {
    "passed": false,
    "time": 0.75,
    "message": "ZeroDivisionError",
    "traceback": "test_math.py:12"
  },
  "tests/elsewhere.py::test_other": { "passed": false }
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

async fn discovered(path: &Path) -> Tests {
    ManifestDiscovery::new(path)
        .discover(CancellationToken::new())
        .await
        .unwrap()
}

fn status_of(tests: &Tests, name_to_run: &str) -> TestStatus {
    tests.function(tests.find_function(name_to_run).unwrap()).outcome.status
}

#[tokio::test]
async fn test_manifest_discovery_builds_tree() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);

    let tests = discovered(&manifest).await;

    assert_eq!(tests.test_files().count(), 2);
    assert_eq!(tests.test_functions().len(), 3);
    assert_eq!(tests.test_suites().len(), 1);
    assert!(tests.find_folder("tests").is_some());

    let io = tests.file(tests.find_file("tests/test_io.py").unwrap());
    assert!(io.has_discovery_errors());
    assert_eq!(io.xml_name, "tests.test_io");
}

#[tokio::test]
async fn test_manifest_discovery_uses_custom_separator() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);

    let tests = ManifestDiscovery::new(&manifest)
        .with_builder(TreeBuilder::new().with_package_separator("/"))
        .discover(CancellationToken::new())
        .await
        .unwrap();

    let math = tests.file(tests.find_file("tests/test_math.py").unwrap());
    assert_eq!(math.xml_name, "tests/test_math");
}

#[tokio::test]
async fn test_missing_manifest_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ManifestDiscovery::new(dir.path().join("missing.json"))
        .discover(CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Io { .. }));
}

#[tokio::test]
async fn test_malformed_manifest_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", "{ not json");

    let err = ManifestDiscovery::new(&manifest)
        .discover(CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Parse(_)));
}

#[tokio::test]
async fn test_cancelled_discovery_does_not_read() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ManifestDiscovery::new("does/not/matter.json")
        .discover(cancel)
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::Cancelled);
}

#[tokio::test]
async fn test_results_runner_applies_all_results() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);
    let results = write(&dir, "results.json", RESULTS);
    let mut tests = discovered(&manifest).await;

    ResultsFileRunner::new(&results)
        .run(&mut tests, None, false, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status_of(&tests, "tests/test_math.py::test_add"), TestStatus::Pass);
    assert_eq!(
        status_of(&tests, "tests/test_math.py::TestDivide::test_by_one"),
        TestStatus::Skipped
    );

    let by_zero = tests.function(
        tests
            .find_function("tests/test_math.py::TestDivide::test_by_zero")
            .unwrap(),
    );
    assert_eq!(by_zero.outcome.passed, Some(false));
    assert_eq!(by_zero.outcome.status, TestStatus::Fail);
    assert_eq!(by_zero.outcome.time, 0.75);
    assert_eq!(by_zero.outcome.message, "ZeroDivisionError");
    assert_eq!(by_zero.outcome.traceback, "test_math.py:12");
}

#[tokio::test]
async fn test_results_runner_limits_to_selection() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);
    let results = write(&dir, "results.json", RESULTS);
    let mut tests = discovered(&manifest).await;

    let suite_id = tests.find_suite("tests/test_math.py::TestDivide").unwrap();
    let selection = TestsToRun::suites(vec![tests.suite(suite_id).clone()]);

    ResultsFileRunner::new(&results)
        .run(&mut tests, Some(&selection), false, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status_of(&tests, "tests/test_math.py::test_add"), TestStatus::Unknown);
    assert_eq!(
        status_of(&tests, "tests/test_math.py::TestDivide::test_by_zero"),
        TestStatus::Fail
    );
}

#[tokio::test]
async fn test_results_runner_failed_only_skips_passing_results() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);
    let results = write(&dir, "results.json", RESULTS);
    let mut tests = discovered(&manifest).await;

    ResultsFileRunner::new(&results)
        .run(&mut tests, None, true, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status_of(&tests, "tests/test_math.py::test_add"), TestStatus::Unknown);
    assert_eq!(
        status_of(&tests, "tests/test_math.py::TestDivide::test_by_zero"),
        TestStatus::Fail
    );
}

#[tokio::test]
async fn test_results_runner_echoes_to_output() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);
    let results = write(&dir, "results.json", RESULTS);
    let mut tests = discovered(&manifest).await;
    let buffer = Arc::new(BufferedOutput::new());

    ResultsFileRunner::new(&results)
        .with_output(OutputChannel::new(buffer.clone()))
        .run(&mut tests, None, false, CancellationToken::new())
        .await
        .unwrap();

    let output = buffer.contents();
    assert!(output.contains("tests/test_math.py::test_add ... PASS\n"));
    assert!(output.contains("tests/test_math.py::TestDivide::test_by_zero ... FAIL\n"));
    assert!(!output.contains("tests/elsewhere.py"));
}

#[tokio::test]
async fn test_results_runner_honours_cancellation() {
    let dir = TempDir::new().unwrap();
    let manifest = write(&dir, "discovered.json", MANIFEST);
    let results = write(&dir, "results.json", RESULTS);
    let mut tests = discovered(&manifest).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = ResultsFileRunner::new(&results)
        .run(&mut tests, None, false, cancel)
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::Cancelled);
    assert_eq!(status_of(&tests, "tests/test_math.py::test_add"), TestStatus::Unknown);
}
