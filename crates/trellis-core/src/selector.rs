use std::sync::Arc;

use tracing::debug;

use crate::model::{TestFile, TestFunction, TestsToRun};
use crate::registry::TestRegistry;

/// Resolves user-supplied names against the last discovered inventory.
#[derive(Clone)]
pub struct TestSelector {
    registry: Arc<dyn TestRegistry>,
}

impl TestSelector {
    pub fn new(registry: Arc<dyn TestRegistry>) -> Self {
        Self { registry }
    }

    /// Turns `name` into a run selection.
    ///
    /// Returns `None` when nothing has been discovered yet. Otherwise the
    /// first non-empty match wins, checking folders, then files, then
    /// functions, each against `name_to_run` or the display name. A name that
    /// matches nothing becomes a bare file selection so the runner can still
    /// be asked for it.
    pub fn resolve_value_as_test_to_run(&self, name: &str) -> Option<TestsToRun> {
        let tests = self.registry.get()?;

        let folders: Vec<_> = tests
            .test_folders()
            .filter(|(_, f)| f.name_to_run == name || f.name == name)
            .map(|(_, f)| f.clone())
            .collect();
        if !folders.is_empty() {
            debug!(name, matches = folders.len(), "Resolved name to folders");
            return Some(TestsToRun::folders(folders));
        }

        let files: Vec<_> = tests
            .test_files()
            .filter(|(_, f)| f.name_to_run == name || f.name == name)
            .map(|(_, f)| f.clone())
            .collect();
        if !files.is_empty() {
            debug!(name, matches = files.len(), "Resolved name to files");
            return Some(TestsToRun::files(files));
        }

        let functions: Vec<TestFunction> = tests
            .test_functions()
            .iter()
            .map(|flat| tests.function(flat.function))
            .filter(|f| f.name_to_run == name || f.name == name)
            .cloned()
            .collect();
        if !functions.is_empty() {
            debug!(name, matches = functions.len(), "Resolved name to functions");
            return Some(TestsToRun::functions(functions));
        }

        debug!(name, "No discovered test matches, treating name as a file");
        Some(TestsToRun::files(vec![TestFile::detached(name)]))
    }
}
