use serde::{Deserialize, Serialize};

use super::status::TestStatus;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the node in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a [`TestFunction`] inside [`Tests`].
    FunctionId
);
arena_id!(
    /// Index of a [`TestSuite`] inside [`Tests`].
    SuiteId
);
arena_id!(
    /// Index of a [`TestFile`] inside [`Tests`].
    FileId
);
arena_id!(
    /// Index of a [`TestFolder`] inside [`Tests`].
    FolderId
);

/// Owner of a function or suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum ParentRef {
    File(FileId),
    Suite(SuiteId),
}

/// Result and rollup fields carried by every node.
///
/// Leaves get them from the run provider, containers from the result
/// aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// `None` until the node (or every descendant) has a result
    pub passed: Option<bool>,
    /// Seconds; containers always hold the sum of their children
    pub time: f64,
    pub message: String,
    pub traceback: String,
    pub status: TestStatus,
    pub functions_passed: u32,
    pub functions_failed: u32,
    pub functions_did_not_run: u32,
}

impl Outcome {
    /// Clears every result field back to the "never ran" state.
    pub fn reset(&mut self) {
        *self = Outcome::default();
    }

    /// Records a finished function result.
    pub fn record(&mut self, passed: bool, time: f64) {
        self.passed = Some(passed);
        self.time = time;
        self.status = if passed {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        };
    }
}

/// A single test function (leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFunction {
    pub name: String,
    /// Identifier understood by the external runner
    pub name_to_run: String,
    pub parent: ParentRef,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// A test class or group; may nest further suites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub name: String,
    pub name_to_run: String,
    /// Class name used in structured reports
    pub xml_name: String,
    pub functions: Vec<FunctionId>,
    pub suites: Vec<SuiteId>,
    pub parent: ParentRef,
    /// File the suite is declared in, regardless of nesting depth
    pub file: FileId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// A discovered test file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFile {
    /// Path-like name, used to place the file in the folder tree
    pub name: String,
    pub name_to_run: String,
    pub xml_name: String,
    pub functions: Vec<FunctionId>,
    pub suites: Vec<SuiteId>,
    /// Raw parser output when the file could not be read during discovery
    pub errors_when_discovering: Option<String>,
    pub folder: Option<FolderId>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl TestFile {
    /// A file that is not part of any tree, addressed only by name.
    pub fn detached(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name_to_run: name.clone(),
            xml_name: name.clone(),
            name,
            functions: Vec::new(),
            suites: Vec::new(),
            errors_when_discovering: None,
            folder: None,
            outcome: Outcome::default(),
        }
    }

    /// Returns true if discovery reported a problem with this file.
    pub fn has_discovery_errors(&self) -> bool {
        self.errors_when_discovering
            .as_deref()
            .is_some_and(|errors| !errors.is_empty())
    }
}

/// A directory in the reconstructed folder tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFolder {
    /// Cumulative path from the root, `/`-separated
    pub name: String,
    pub name_to_run: String,
    pub files: Vec<FileId>,
    pub folders: Vec<FolderId>,
    pub parent: Option<FolderId>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Flattened view of a function with its resolved reporting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedTestFunction {
    pub function: FunctionId,
    pub xml_class_name: String,
    pub parent_file: FileId,
    pub parent_suite: Option<SuiteId>,
}

/// Flattened view of a suite with its resolved reporting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedTestSuite {
    pub suite: SuiteId,
    pub xml_class_name: String,
    pub parent_file: FileId,
}

/// Totals reported for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub passed: u32,
    pub failures: u32,
    pub errors: u32,
    pub skipped: u32,
}

/// The discovered test inventory.
///
/// Owns every node; all cross references are arena indices, so a reset or a
/// rollup mutates nodes in place without invalidating the flattened indexes.
///
/// Only the tree builder constructs one, which keeps every index in range;
/// for that reason it can be serialized but not deserialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tests {
    pub(crate) functions: Vec<TestFunction>,
    pub(crate) suites: Vec<TestSuite>,
    pub(crate) files: Vec<TestFile>,
    pub(crate) folders: Vec<TestFolder>,
    pub(crate) root_folders: Vec<FolderId>,
    pub(crate) flattened_functions: Vec<FlattenedTestFunction>,
    pub(crate) flattened_suites: Vec<FlattenedTestSuite>,
    pub summary: Summary,
}

impl Tests {
    /// An inventory with no nodes and a zero summary.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if discovery produced no functions at all.
    pub fn is_empty(&self) -> bool {
        self.flattened_functions.is_empty()
    }

    pub fn function(&self, id: FunctionId) -> &TestFunction {
        &self.functions[id.0]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut TestFunction {
        &mut self.functions[id.0]
    }

    pub fn suite(&self, id: SuiteId) -> &TestSuite {
        &self.suites[id.0]
    }

    pub fn suite_mut(&mut self, id: SuiteId) -> &mut TestSuite {
        &mut self.suites[id.0]
    }

    pub fn file(&self, id: FileId) -> &TestFile {
        &self.files[id.0]
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut TestFile {
        &mut self.files[id.0]
    }

    pub fn folder(&self, id: FolderId) -> &TestFolder {
        &self.folders[id.0]
    }

    pub fn folder_mut(&mut self, id: FolderId) -> &mut TestFolder {
        &mut self.folders[id.0]
    }

    /// Every file, in discovery order.
    pub fn test_files(&self) -> impl Iterator<Item = (FileId, &TestFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    /// Every folder anywhere in the tree, parents before children.
    pub fn test_folders(&self) -> impl Iterator<Item = (FolderId, &TestFolder)> {
        self.folders.iter().enumerate().map(|(i, f)| (FolderId(i), f))
    }

    /// Top-level folders only.
    pub fn root_test_folders(&self) -> &[FolderId] {
        &self.root_folders
    }

    /// Every function at any depth, with its reporting context.
    pub fn test_functions(&self) -> &[FlattenedTestFunction] {
        &self.flattened_functions
    }

    /// Every suite at any depth, with its reporting context.
    pub fn test_suites(&self) -> &[FlattenedTestSuite] {
        &self.flattened_suites
    }

    pub fn find_folder(&self, name_to_run: &str) -> Option<FolderId> {
        self.folders
            .iter()
            .position(|f| f.name_to_run == name_to_run)
            .map(FolderId)
    }

    pub fn find_file(&self, name_to_run: &str) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.name_to_run == name_to_run)
            .map(FileId)
    }

    pub fn find_suite(&self, name_to_run: &str) -> Option<SuiteId> {
        self.suites
            .iter()
            .position(|s| s.name_to_run == name_to_run)
            .map(SuiteId)
    }

    pub fn find_function(&self, name_to_run: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.name_to_run == name_to_run)
            .map(FunctionId)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{flatten_test_files, DiscoveredFile, DiscoveredFunction};

    #[test]
    fn test_snapshot_serializes_with_camel_case_keys() {
        let tests = flatten_test_files(vec![DiscoveredFile::new("t/test_a.py")
            .with_function(DiscoveredFunction::new("test_one", "t/test_a.py::test_one"))]);

        let json = serde_json::to_value(&tests).unwrap();

        assert_eq!(json["rootFolders"], serde_json::json!([0]));
        assert_eq!(json["files"][0]["nameToRun"], "t/test_a.py");
        assert_eq!(json["files"][0]["folder"], 0);
        assert_eq!(json["functions"][0]["parent"]["kind"], "file");
        assert_eq!(json["flattenedFunctions"][0]["xmlClassName"], "t.test_a");
        assert_eq!(json["summary"]["passed"], 0);
    }
}
