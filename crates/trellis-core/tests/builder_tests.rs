use trellis_core::{
    flatten_test_files, DiscoveredFile, DiscoveredFunction, DiscoveredSuite, ParentRef, Tests,
};

fn folder_names(tests: &Tests) -> Vec<String> {
    tests.test_folders().map(|(_, f)| f.name.clone()).collect()
}

fn file_names_in(tests: &Tests, folder: &str) -> Vec<String> {
    let id = tests.find_folder(folder).expect("folder exists");
    tests
        .folder(id)
        .files
        .iter()
        .map(|&file| tests.file(file).name.clone())
        .collect()
}

fn nested_file() -> DiscoveredFile {
    DiscoveredFile::new("tests/test_shapes.py")
        .with_function(DiscoveredFunction::new("test_top", "tests/test_shapes.py::test_top"))
        .with_suite(
            DiscoveredSuite::new("TestShapes", "tests/test_shapes.py::TestShapes")
                .with_xml_name("tests.test_shapes.TestShapes")
                .with_function(DiscoveredFunction::new(
                    "test_area",
                    "tests/test_shapes.py::TestShapes::test_area",
                ))
                .with_suite(
                    DiscoveredSuite::new("TestCircle", "tests/test_shapes.py::TestShapes::TestCircle")
                        .with_xml_name("tests.test_shapes.TestShapes.TestCircle")
                        .with_function(DiscoveredFunction::new(
                            "test_radius",
                            "tests/test_shapes.py::TestShapes::TestCircle::test_radius",
                        )),
                ),
        )
        .with_suite(
            DiscoveredSuite::new("TestLines", "tests/test_shapes.py::TestLines").with_function(
                DiscoveredFunction::new("test_length", "tests/test_shapes.py::TestLines::test_length"),
            ),
        )
}

#[test]
fn test_folder_tree_from_flat_paths() {
    let tests = flatten_test_files(vec![
        DiscoveredFile::new("a/b/x_test"),
        DiscoveredFile::new("a/b/y_test"),
        DiscoveredFile::new("a/c/z_test"),
    ]);

    assert_eq!(folder_names(&tests), vec!["a", "a/b", "a/c"]);
    assert_eq!(file_names_in(&tests, "a/b"), vec!["a/b/x_test", "a/b/y_test"]);
    assert_eq!(file_names_in(&tests, "a/c"), vec!["a/c/z_test"]);
    assert!(file_names_in(&tests, "a").is_empty());

    let roots = tests.root_test_folders();
    assert_eq!(roots.len(), 1);
    assert_eq!(tests.folder(roots[0]).name, "a");

    let a = tests.find_folder("a").unwrap();
    let children: Vec<&str> = tests
        .folder(a)
        .folders
        .iter()
        .map(|&f| tests.folder(f).name.as_str())
        .collect();
    assert_eq!(children, vec!["a/b", "a/c"]);
}

#[test]
fn test_files_link_back_to_their_folder() {
    let tests = flatten_test_files(vec![
        DiscoveredFile::new("a/c/z_test"),
        DiscoveredFile::new("a/b/x_test"),
    ]);

    for (id, file) in tests.test_files() {
        let folder = tests.folder(file.folder.expect("file placed in a folder"));
        assert!(folder.files.contains(&id));
    }

    let ab = tests.find_folder("a/b").unwrap();
    assert_eq!(tests.folder(ab).parent, tests.find_folder("a"));
}

#[test]
fn test_files_without_directory_go_to_current_folder() {
    let tests = flatten_test_files(vec![
        DiscoveredFile::new("test_root.py"),
        DiscoveredFile::new("pkg/test_pkg.py"),
    ]);

    assert_eq!(folder_names(&tests), vec![".", "pkg"]);
    assert_eq!(tests.root_test_folders().len(), 2);
    assert_eq!(file_names_in(&tests, "."), vec!["test_root.py"]);
}

#[test]
fn test_empty_files_are_kept_as_leaves() {
    let tests = flatten_test_files(vec![DiscoveredFile::new("a/empty_test.py")]);

    assert_eq!(tests.test_files().count(), 1);
    assert!(tests.test_functions().is_empty());
    assert!(tests.test_suites().is_empty());
    assert_eq!(file_names_in(&tests, "a"), vec!["a/empty_test.py"]);
}

#[test]
fn test_every_function_flattened_once_with_immediate_class_name() {
    let tests = flatten_test_files(vec![nested_file()]);

    let flattened: Vec<(&str, &str)> = tests
        .test_functions()
        .iter()
        .map(|f| (tests.function(f.function).name.as_str(), f.xml_class_name.as_str()))
        .collect();

    assert_eq!(
        flattened,
        vec![
            ("test_top", "tests.test_shapes"),
            ("test_area", "tests.test_shapes.TestShapes"),
            ("test_radius", "tests.test_shapes.TestShapes.TestCircle"),
            ("test_length", "TestLines"),
        ]
    );
}

#[test]
fn test_suites_flattened_in_pre_order() {
    let tests = flatten_test_files(vec![nested_file()]);

    let suites: Vec<&str> = tests
        .test_suites()
        .iter()
        .map(|s| tests.suite(s.suite).name.as_str())
        .collect();
    assert_eq!(suites, vec!["TestShapes", "TestCircle", "TestLines"]);

    for flat in tests.test_suites() {
        assert_eq!(flat.xml_class_name, tests.suite(flat.suite).xml_name);
    }
}

#[test]
fn test_parent_references() {
    let tests = flatten_test_files(vec![nested_file()]);
    let file = tests.find_file("tests/test_shapes.py").unwrap();
    let outer = tests.find_suite("tests/test_shapes.py::TestShapes").unwrap();
    let inner = tests.find_suite("tests/test_shapes.py::TestShapes::TestCircle").unwrap();
    let radius = tests
        .find_function("tests/test_shapes.py::TestShapes::TestCircle::test_radius")
        .unwrap();

    assert_eq!(tests.suite(outer).parent, ParentRef::File(file));
    assert_eq!(tests.suite(inner).parent, ParentRef::Suite(outer));
    assert_eq!(tests.suite(inner).file, file);
    assert_eq!(tests.function(radius).parent, ParentRef::Suite(inner));
    assert_eq!(tests.owning_file(radius), file);

    let flat = tests
        .test_functions()
        .iter()
        .find(|f| f.function == radius)
        .unwrap();
    assert_eq!(flat.parent_file, file);
    assert_eq!(flat.parent_suite, Some(inner));
}

#[test]
fn test_file_xml_name_defaults_to_package() {
    let tests = flatten_test_files(vec![nested_file()]);
    let file = tests.find_file("tests/test_shapes.py").unwrap();
    assert_eq!(tests.file(file).xml_name, "tests.test_shapes");
}
