use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::tree::{FileId, FolderId, FunctionId, ParentRef, SuiteId, TestFile, TestFolder, TestFunction, TestSuite, Tests};

/// A set of nodes to hand to the run provider.
///
/// Nodes are detached copies; providers address them by `name_to_run`, so a
/// selection stays meaningful against a re-discovered tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestsToRun {
    #[serde(default)]
    pub test_folder: Vec<TestFolder>,
    #[serde(default)]
    pub test_file: Vec<TestFile>,
    #[serde(default)]
    pub test_function: Vec<TestFunction>,
    #[serde(default)]
    pub test_suite: Vec<TestSuite>,
}

impl TestsToRun {
    pub fn folders(folders: Vec<TestFolder>) -> Self {
        Self {
            test_folder: folders,
            ..Self::default()
        }
    }

    pub fn files(files: Vec<TestFile>) -> Self {
        Self {
            test_file: files,
            ..Self::default()
        }
    }

    pub fn functions(functions: Vec<TestFunction>) -> Self {
        Self {
            test_function: functions,
            ..Self::default()
        }
    }

    pub fn suites(suites: Vec<TestSuite>) -> Self {
        Self {
            test_suite: suites,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.test_folder.is_empty()
            && self.test_file.is_empty()
            && self.test_function.is_empty()
            && self.test_suite.is_empty()
    }
}

/// What a run should cover.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunTarget {
    /// Every discovered test
    #[default]
    All,
    /// Only tests that failed previously; the run provider decides which
    Failed,
    /// An explicit selection
    Selection(TestsToRun),
}

impl RunTarget {
    pub fn selection(&self) -> Option<&TestsToRun> {
        match self {
            RunTarget::Selection(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn run_failed_only(&self) -> bool {
        matches!(self, RunTarget::Failed)
    }
}

impl From<TestsToRun> for RunTarget {
    fn from(selection: TestsToRun) -> Self {
        RunTarget::Selection(selection)
    }
}

impl Tests {
    /// Expands a selection into the functions it covers in this tree.
    ///
    /// Names that are not part of the tree expand to nothing. Each function
    /// appears once, in the order it was first reached.
    pub fn functions_for_selection(&self, selection: &TestsToRun) -> Vec<FunctionId> {
        let mut out = Collected::default();

        for folder in &selection.test_folder {
            if let Some(id) = self.find_folder(&folder.name_to_run) {
                self.collect_folder(id, &mut out);
            }
        }
        for file in &selection.test_file {
            if let Some(id) = self.find_file(&file.name_to_run) {
                self.collect_file(id, &mut out);
            }
        }
        for suite in &selection.test_suite {
            if let Some(id) = self.find_suite(&suite.name_to_run) {
                self.collect_suite(id, &mut out);
            }
        }
        for function in &selection.test_function {
            if let Some(id) = self.find_function(&function.name_to_run) {
                out.push(id);
            }
        }

        out.ids
    }

    /// Every function in the tree, in flattened order.
    pub fn all_functions(&self) -> Vec<FunctionId> {
        self.flattened_functions.iter().map(|f| f.function).collect()
    }

    /// The file a function belongs to, following suite nesting.
    pub fn owning_file(&self, id: FunctionId) -> FileId {
        match self.function(id).parent {
            ParentRef::File(file) => file,
            ParentRef::Suite(suite) => self.suite(suite).file,
        }
    }

    fn collect_folder(&self, id: FolderId, out: &mut Collected) {
        let folder = self.folder(id);
        for &file in &folder.files {
            self.collect_file(file, out);
        }
        for &child in &folder.folders {
            self.collect_folder(child, out);
        }
    }

    fn collect_file(&self, id: FileId, out: &mut Collected) {
        let file = self.file(id);
        for &function in &file.functions {
            out.push(function);
        }
        for &suite in &file.suites {
            self.collect_suite(suite, out);
        }
    }

    fn collect_suite(&self, id: SuiteId, out: &mut Collected) {
        let suite = self.suite(id);
        for &function in &suite.functions {
            out.push(function);
        }
        for &child in &suite.suites {
            self.collect_suite(child, out);
        }
    }
}

/// Functions in first-reached order, without repeats.
#[derive(Default)]
struct Collected {
    ids: Vec<FunctionId>,
    seen: HashSet<FunctionId>,
}

impl Collected {
    fn push(&mut self, id: FunctionId) {
        if self.seen.insert(id) {
            self.ids.push(id);
        }
    }
}
