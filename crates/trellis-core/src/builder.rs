//! Builds a [`Tests`] inventory from discovered files.
//!
//! Discovery hands over a nested file → suite → function shape. The builder
//! moves it into arenas, records the flattened function/suite indexes with
//! their reporting class names, and reconstructs the folder tree from the
//! file paths.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_PACKAGE_SEPARATOR;
use crate::model::{
    FileId, FlattenedTestFunction, FlattenedTestSuite, FolderId, FunctionId, Outcome, ParentRef,
    SuiteId, TestFile, TestFolder, TestFunction, TestSuite, Tests,
};

/// Folder that holds files without a directory component.
pub const CURRENT_DIR: &str = ".";

/// A function as reported by the external discovery step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredFunction {
    pub name: String,
    pub name_to_run: String,
}

impl DiscoveredFunction {
    pub fn new(name: impl Into<String>, name_to_run: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_to_run: name_to_run.into(),
        }
    }
}

/// A suite as reported by the external discovery step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredSuite {
    pub name: String,
    pub name_to_run: String,
    /// Reporting class name; falls back to `name`
    #[serde(default)]
    pub xml_name: Option<String>,
    #[serde(default)]
    pub functions: Vec<DiscoveredFunction>,
    #[serde(default)]
    pub suites: Vec<DiscoveredSuite>,
}

impl DiscoveredSuite {
    pub fn new(name: impl Into<String>, name_to_run: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_to_run: name_to_run.into(),
            xml_name: None,
            functions: Vec::new(),
            suites: Vec::new(),
        }
    }

    pub fn with_xml_name(mut self, xml_name: impl Into<String>) -> Self {
        self.xml_name = Some(xml_name.into());
        self
    }

    pub fn with_function(mut self, function: DiscoveredFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_suite(mut self, suite: DiscoveredSuite) -> Self {
        self.suites.push(suite);
        self
    }
}

/// A file as reported by the external discovery step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredFile {
    /// Path relative to the test root
    pub name: String,
    pub name_to_run: String,
    /// Reporting name; falls back to the derived package name
    #[serde(default)]
    pub xml_name: Option<String>,
    #[serde(default)]
    pub functions: Vec<DiscoveredFunction>,
    #[serde(default)]
    pub suites: Vec<DiscoveredSuite>,
    #[serde(default)]
    pub errors_when_discovering: Option<String>,
}

impl DiscoveredFile {
    /// A file whose runner identifier is its path.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name_to_run: name.clone(),
            name,
            xml_name: None,
            functions: Vec::new(),
            suites: Vec::new(),
            errors_when_discovering: None,
        }
    }

    pub fn with_function(mut self, function: DiscoveredFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_suite(mut self, suite: DiscoveredSuite) -> Self {
        self.suites.push(suite);
        self
    }

    pub fn with_errors(mut self, errors: impl Into<String>) -> Self {
        self.errors_when_discovering = Some(errors.into());
        self
    }
}

/// Turns discovered files into a [`Tests`] inventory.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    package_separator: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            package_separator: DEFAULT_PACKAGE_SEPARATOR.to_string(),
        }
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `separator` instead of `.` when deriving package names.
    pub fn with_package_separator(mut self, separator: impl Into<String>) -> Self {
        self.package_separator = separator.into();
        self
    }

    /// Builds the full inventory: arenas, flattened indexes and folders.
    pub fn build(&self, files: Vec<DiscoveredFile>) -> Tests {
        let mut tests = Tests::empty();

        for file in files {
            let file_id = FileId(tests.files.len());
            let package_name = convert_file_to_package(&file.name, &self.package_separator);

            tests.files.push(TestFile {
                xml_name: file.xml_name.unwrap_or_else(|| package_name.clone()),
                name: file.name,
                name_to_run: file.name_to_run,
                functions: Vec::new(),
                suites: Vec::new(),
                errors_when_discovering: file.errors_when_discovering,
                folder: None,
                outcome: Outcome::default(),
            });

            for function in file.functions {
                let id = push_function(&mut tests, function, ParentRef::File(file_id));
                tests.files[file_id.0].functions.push(id);
                tests.flattened_functions.push(FlattenedTestFunction {
                    function: id,
                    xml_class_name: package_name.clone(),
                    parent_file: file_id,
                    parent_suite: None,
                });
            }

            for suite in file.suites {
                let id = add_suite(&mut tests, suite, file_id, ParentRef::File(file_id));
                tests.files[file_id.0].suites.push(id);
            }
        }

        place_test_files_in_folders(&mut tests);

        debug!(
            files = tests.files.len(),
            suites = tests.suites.len(),
            functions = tests.functions.len(),
            folders = tests.folders.len(),
            "Built test tree"
        );

        tests
    }
}

/// Builds an inventory with the default package separator.
pub fn flatten_test_files(files: Vec<DiscoveredFile>) -> Tests {
    TreeBuilder::default().build(files)
}

fn push_function(tests: &mut Tests, function: DiscoveredFunction, parent: ParentRef) -> FunctionId {
    let id = FunctionId(tests.functions.len());
    tests.functions.push(TestFunction {
        name: function.name,
        name_to_run: function.name_to_run,
        parent,
        outcome: Outcome::default(),
    });
    id
}

/// Adds a suite and everything below it, depth-first, pre-order.
///
/// Functions inside a suite report under the suite's own `xml_name`, not the
/// file's package name.
fn add_suite(tests: &mut Tests, suite: DiscoveredSuite, file: FileId, parent: ParentRef) -> SuiteId {
    let id = SuiteId(tests.suites.len());
    let xml_name = suite.xml_name.unwrap_or_else(|| suite.name.clone());

    tests.suites.push(TestSuite {
        name: suite.name,
        name_to_run: suite.name_to_run,
        xml_name: xml_name.clone(),
        functions: Vec::new(),
        suites: Vec::new(),
        parent,
        file,
        outcome: Outcome::default(),
    });
    tests.flattened_suites.push(FlattenedTestSuite {
        suite: id,
        xml_class_name: xml_name.clone(),
        parent_file: file,
    });

    for function in suite.functions {
        let function_id = push_function(tests, function, ParentRef::Suite(id));
        tests.suites[id.0].functions.push(function_id);
        tests.flattened_functions.push(FlattenedTestFunction {
            function: function_id,
            xml_class_name: xml_name.clone(),
            parent_file: file,
            parent_suite: Some(id),
        });
    }

    for child in suite.suites {
        let child_id = add_suite(tests, child, file, ParentRef::Suite(id));
        tests.suites[id.0].suites.push(child_id);
    }

    id
}

/// Rebuilds the folder forest from the files' directories.
///
/// Directories are visited in sorted order and split into segments; each
/// cumulative path gets one folder, linked under its parent (or recorded as
/// a root) and given every file whose directory is exactly that path.
pub fn place_test_files_in_folders(tests: &mut Tests) {
    tests.folders.clear();
    tests.root_folders.clear();
    for file in &mut tests.files {
        file.folder = None;
    }

    let file_dirs: Vec<String> = tests.files.iter().map(|f| directory_of(&f.name)).collect();

    let mut dirs: Vec<&str> = file_dirs.iter().map(String::as_str).collect();
    dirs.sort_unstable();
    dirs.dedup();

    let mut folder_map: HashMap<String, FolderId> = HashMap::new();

    for dir in dirs {
        let mut parent_path = String::new();

        for segment in path_segments(dir) {
            let (new_path, parent) = if parent_path.is_empty() {
                (segment.to_string(), None)
            } else {
                (
                    join_path(&parent_path, segment),
                    folder_map.get(&parent_path).copied(),
                )
            };

            if !folder_map.contains_key(&new_path) {
                let id = FolderId(tests.folders.len());
                let files: Vec<FileId> = file_dirs
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| **d == new_path)
                    .map(|(i, _)| FileId(i))
                    .collect();

                for file in &files {
                    tests.files[file.0].folder = Some(id);
                }

                tests.folders.push(TestFolder {
                    name: new_path.clone(),
                    name_to_run: new_path.clone(),
                    files,
                    folders: Vec::new(),
                    parent,
                    outcome: Outcome::default(),
                });

                match parent {
                    Some(parent) => tests.folders[parent.0].folders.push(id),
                    None => tests.root_folders.push(id),
                }

                folder_map.insert(new_path.clone(), id);
            }

            parent_path = new_path;
        }
    }
}

/// Derives a reporting package name from a file path.
///
/// `tests/unit/test_math.py` becomes `tests.unit.test_math`. Only the
/// extension of the last component is stripped.
pub fn convert_file_to_package(file_path: &str, separator: &str) -> String {
    let name_start = file_path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let without_extension = match file_path[name_start..].rfind('.') {
        Some(dot) => &file_path[..name_start + dot],
        None => file_path,
    };

    without_extension.replace(['/', '\\'], separator)
}

/// Splits a path on either separator, dropping empty segments. An absolute
/// path keeps `/` as its first segment.
fn path_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    if path.starts_with(['/', '\\']) {
        segments.push("/");
    }
    segments.extend(path.split(['/', '\\']).filter(|s| !s.is_empty()));
    segments
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, segment)
    } else {
        format!("{}/{}", parent, segment)
    }
}

/// Normalized directory of a file path; `.` when there is none.
fn directory_of(file_path: &str) -> String {
    let segments = path_segments(file_path);
    match segments.split_last() {
        Some((_, dirs)) if !dirs.is_empty() => dirs
            .iter()
            .skip(1)
            .fold(dirs[0].to_string(), |acc, s| join_path(&acc, s)),
        _ => CURRENT_DIR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_file_to_package() {
        assert_eq!(convert_file_to_package("tests/unit/test_math.py", "."), "tests.unit.test_math");
        assert_eq!(convert_file_to_package("tests\\unit\\test_io.py", "."), "tests.unit.test_io");
        assert_eq!(convert_file_to_package("pkg.v2/test_a.py", "."), "pkg.v2.test_a");
        assert_eq!(convert_file_to_package("a/b/x_test", "::"), "a::b::x_test");
    }

    #[test]
    fn test_directory_of() {
        assert_eq!(directory_of("a/b/x.py"), "a/b");
        assert_eq!(directory_of("a//b\\x.py"), "a/b");
        assert_eq!(directory_of("x.py"), ".");
        assert_eq!(directory_of("/x.py"), "/");
        assert_eq!(directory_of("/srv/t/x.py"), "/srv/t");
    }

    #[test]
    fn test_absolute_paths_keep_root_folder() {
        let tests = flatten_test_files(vec![DiscoveredFile::new("/srv/x.py")]);

        let names: Vec<&str> = tests.test_folders().map(|(_, f)| f.name.as_str()).collect();
        assert_eq!(names, vec!["/", "/srv"]);
        assert_eq!(tests.root_test_folders().len(), 1);
    }

    #[test]
    fn test_repeated_separators_do_not_duplicate_folders() {
        let tests = flatten_test_files(vec![
            DiscoveredFile::new("a//b/x.py"),
            DiscoveredFile::new("a/b/y.py"),
        ]);

        let names: Vec<&str> = tests.test_folders().map(|(_, f)| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a/b"]);
        assert_eq!(tests.folder(FolderId(1)).files.len(), 2);
    }

    #[test]
    fn test_custom_package_separator() {
        let tests = TreeBuilder::new()
            .with_package_separator("/")
            .build(vec![DiscoveredFile::new("a\\b\\t.py")
                .with_function(DiscoveredFunction::new("t1", "a/b/t.py::t1"))]);

        assert_eq!(tests.test_functions()[0].xml_class_name, "a/b/t");
    }
}
