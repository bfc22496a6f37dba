//! Plain-text rendering of an inventory.

use trellis_core::{FolderId, Outcome, SuiteId, TestStatus, Tests};

const INDENT: &str = "  ";

/// Renders the folder tree with each node's status.
pub fn tree(tests: &Tests) -> String {
    let mut out = String::new();
    for &folder in tests.root_test_folders() {
        render_folder(tests, folder, 0, &mut out);
    }
    out
}

/// One-line run summary.
pub fn summary(tests: &Tests) -> String {
    let summary = &tests.summary;
    format!(
        "{} passed, {} failed, {} errors, {} skipped",
        summary.passed, summary.failures, summary.errors, summary.skipped
    )
}

fn render_folder(tests: &Tests, id: FolderId, depth: usize, out: &mut String) {
    let folder = tests.folder(id);
    push_line(out, depth, &folder.name, &folder.outcome);

    for &file in &folder.files {
        let file = tests.file(file);
        push_line(out, depth + 1, &file.name, &file.outcome);
        if let Some(errors) = file.errors_when_discovering.as_deref().filter(|e| !e.is_empty()) {
            let first = errors.lines().next().unwrap_or_default();
            out.push_str(&format!("{}! {}\n", INDENT.repeat(depth + 2), first));
        }
        for &function in &file.functions {
            let function = tests.function(function);
            push_line(out, depth + 2, &function.name, &function.outcome);
        }
        for &suite in &file.suites {
            render_suite(tests, suite, depth + 2, out);
        }
    }

    for &child in &folder.folders {
        render_folder(tests, child, depth + 1, out);
    }
}

fn render_suite(tests: &Tests, id: SuiteId, depth: usize, out: &mut String) {
    let suite = tests.suite(id);
    push_line(out, depth, &suite.name, &suite.outcome);

    for &function in &suite.functions {
        let function = tests.function(function);
        push_line(out, depth + 1, &function.name, &function.outcome);
    }
    for &child in &suite.suites {
        render_suite(tests, child, depth + 1, out);
    }
}

fn push_line(out: &mut String, depth: usize, name: &str, outcome: &Outcome) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(name);
    if outcome.status != TestStatus::Unknown {
        out.push_str(&format!(" [{}]", outcome.status));
    }
    if outcome.time > 0.0 {
        out.push_str(&format!(" ({:.2}s)", outcome.time));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{flatten_test_files, update_results, DiscoveredFile, DiscoveredFunction};

    #[test]
    fn test_tree_lists_nodes_with_status() {
        let mut tests = flatten_test_files(vec![DiscoveredFile::new("t/test_a.py")
            .with_function(DiscoveredFunction::new("test_one", "t/test_a.py::test_one"))]);
        let id = tests.find_function("t/test_a.py::test_one").unwrap();
        tests.function_mut(id).outcome.record(true, 0.5);
        update_results(&mut tests);

        assert_eq!(
            tree(&tests),
            "t [Idle] (0.50s)\n  t/test_a.py [Idle] (0.50s)\n    test_one [Pass] (0.50s)\n"
        );
        assert_eq!(summary(&tests), "1 passed, 0 failed, 0 errors, 0 skipped");
    }

    #[test]
    fn test_tree_shows_discovery_errors() {
        let tests = flatten_test_files(vec![
            DiscoveredFile::new("t/test_b.py").with_errors("ImportError: x\nmore")
        ]);

        assert_eq!(tree(&tests), "t\n  t/test_b.py\n    ! ImportError: x\n");
    }
}
