use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::builder::{DiscoveredFile, TreeBuilder};
use crate::model::{TestStatus, Tests, TestsToRun};
use crate::output::OutputChannel;

use super::{DiscoveryProvider, ProviderError, RunProvider};

/// Discovery backed by a JSON manifest.
///
/// The manifest is an array of discovered files, as a framework adapter
/// would produce from its runner's collection output:
/// ```text
/// [
///   { "name": "tests/test_math.py", "nameToRun": "tests/test_math.py",
///     "functions": [{ "name": "test_add", "nameToRun": "tests/test_math.py::test_add" }],
///     "suites": [] }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct ManifestDiscovery {
    path: PathBuf,
    builder: TreeBuilder,
}

impl ManifestDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            builder: TreeBuilder::default(),
        }
    }

    /// Uses a custom tree builder (e.g. another package separator).
    pub fn with_builder(mut self, builder: TreeBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DiscoveryProvider for ManifestDiscovery {
    async fn discover(&self, cancel: CancellationToken) -> Result<Tests, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ProviderError::io(&self.path, e))?;
        let files: Vec<DiscoveredFile> = serde_json::from_str(&json)?;

        debug!(path = %self.path.display(), files = files.len(), "Loaded test manifest");
        Ok(self.builder.build(files))
    }
}

/// One recorded function result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResult {
    pub passed: bool,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub traceback: String,
    /// Overrides the status derived from `passed` (e.g. `Skipped`, `Error`)
    #[serde(default)]
    pub status: Option<TestStatus>,
}

/// Run provider that replays results recorded by an external runner.
///
/// Reads a JSON object keyed by `nameToRun` and applies each entry to the
/// functions in scope. Entries for functions outside the scope are ignored.
#[derive(Clone)]
pub struct ResultsFileRunner {
    path: PathBuf,
    output: Option<OutputChannel>,
}

impl ResultsFileRunner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            output: None,
        }
    }

    /// Echoes one line per applied result to `output`.
    pub fn with_output(mut self, output: OutputChannel) -> Self {
        self.output = Some(output);
        self
    }

    async fn load(&self) -> Result<HashMap<String, RecordedResult>, ProviderError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ProviderError::io(&self.path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[async_trait]
impl RunProvider for ResultsFileRunner {
    async fn run(
        &self,
        tests: &mut Tests,
        selection: Option<&TestsToRun>,
        run_failed_only: bool,
        cancel: CancellationToken,
    ) -> Result<(), ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let results = self.load().await?;
        let scope = match selection {
            Some(selection) => tests.functions_for_selection(selection),
            None => tests.all_functions(),
        };

        let mut applied = 0usize;
        for id in scope {
            if cancel.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }

            let function = tests.function_mut(id);
            let Some(result) = results.get(&function.name_to_run) else {
                continue;
            };
            if run_failed_only && result.passed {
                continue;
            }

            function.outcome.record(result.passed, result.time);
            function.outcome.message = result.message.clone();
            function.outcome.traceback = result.traceback.clone();
            if let Some(status) = result.status {
                function.outcome.status = status;
            }
            applied += 1;

            if let Some(output) = &self.output {
                output.std_out(&format!(
                    "{} ... {}\n",
                    function.name_to_run,
                    function.outcome.status.display_name().to_uppercase()
                ));
            }
        }

        debug!(path = %self.path.display(), applied, "Applied recorded results");
        Ok(())
    }
}
