//! Bottom-up result aggregation.
//!
//! Run providers only fill in leaf functions. These rollups derive time,
//! counters and the tri-state pass/fail/unknown outcome of every suite,
//! file and folder from its children, children first.

use crate::model::{FileId, FolderId, FunctionId, Outcome, SuiteId, Summary, TestStatus, Tests};

/// Recomputes every container from the current leaf results.
///
/// Files (and their suites) are settled before folders, since a folder reads
/// its files' already-computed outcomes.
pub fn update_results(tests: &mut Tests) {
    for index in 0..tests.files.len() {
        update_results_upstream(tests, FileId(index));
    }

    let roots = tests.root_folders.clone();
    for folder in roots {
        update_folder_results_upstream(tests, folder);
    }

    update_summary(tests);
}

/// Rolls a file's functions and suites up into the file.
pub fn update_results_upstream(tests: &mut Tests, id: FileId) {
    let file = tests.file(id);
    let (functions, suites) = (file.functions.clone(), file.suites.clone());

    let rollup = rollup_container(tests, &functions, &suites);
    rollup.apply(&mut tests.file_mut(id).outcome, TestStatus::Error);
}

/// Rolls a suite's functions and nested suites up into the suite.
pub fn update_suite_results_upstream(tests: &mut Tests, id: SuiteId) {
    let suite = tests.suite(id);
    let (functions, suites) = (suite.functions.clone(), suite.suites.clone());

    let rollup = rollup_container(tests, &functions, &suites);
    rollup.apply(&mut tests.suite_mut(id).outcome, TestStatus::Error);
}

/// Rolls a folder's files and child folders up into the folder.
///
/// Expects the files to be settled already; child folders are settled here.
pub fn update_folder_results_upstream(tests: &mut Tests, id: FolderId) {
    let folder = tests.folder(id);
    let (files, folders) = (folder.files.clone(), folder.folders.clone());

    let mut rollup = Rollup::default();
    for file in files {
        rollup.add_child(&tests.file(file).outcome);
    }
    for child in folders {
        update_folder_results_upstream(tests, child);
        rollup.add_child(&tests.folder(child).outcome);
    }

    rollup.apply(&mut tests.folder_mut(id).outcome, TestStatus::Fail);
}

/// Recounts the run summary from function statuses.
pub fn update_summary(tests: &mut Tests) {
    let mut summary = Summary::default();
    for function in &tests.functions {
        match function.outcome.status {
            TestStatus::Pass => summary.passed += 1,
            TestStatus::Fail => summary.failures += 1,
            TestStatus::Error => summary.errors += 1,
            TestStatus::Skipped => summary.skipped += 1,
            _ => {}
        }
    }
    tests.summary = summary;
}

/// Clears every result field in the tree, in place.
///
/// Goes through the flat lists so each node is reached exactly once,
/// whatever its depth.
pub fn reset_test_results(tests: &mut Tests) {
    for folder in &mut tests.folders {
        folder.outcome.reset();
    }

    let functions: Vec<FunctionId> = tests.flattened_functions.iter().map(|f| f.function).collect();
    for id in functions {
        tests.function_mut(id).outcome.reset();
    }

    let suites: Vec<SuiteId> = tests.flattened_suites.iter().map(|s| s.suite).collect();
    for id in suites {
        tests.suite_mut(id).outcome.reset();
    }

    for file in &mut tests.files {
        file.outcome.reset();
    }

    tests.summary = Summary::default();
}

fn rollup_container(tests: &mut Tests, functions: &[FunctionId], suites: &[SuiteId]) -> Rollup {
    let mut rollup = Rollup::default();

    for &id in functions {
        let outcome = &mut tests.function_mut(id).outcome;
        settle_leaf_counters(outcome);
        rollup.add_child(outcome);
    }

    for &id in suites {
        update_suite_results_upstream(tests, id);
        rollup.add_child(&tests.suite(id).outcome);
    }

    rollup
}

/// A leaf counts itself in exactly one counter.
fn settle_leaf_counters(outcome: &mut Outcome) {
    let (passed, failed, did_not_run) = match outcome.passed {
        Some(true) => (1, 0, 0),
        Some(false) => (0, 1, 0),
        None => (0, 0, 1),
    };
    outcome.functions_passed = passed;
    outcome.functions_failed = failed;
    outcome.functions_did_not_run = did_not_run;
}

struct Rollup {
    time: f64,
    all_ran: bool,
    all_passed: bool,
    functions_passed: u32,
    functions_failed: u32,
    functions_did_not_run: u32,
}

impl Default for Rollup {
    fn default() -> Self {
        Self {
            time: 0.0,
            all_ran: true,
            all_passed: true,
            functions_passed: 0,
            functions_failed: 0,
            functions_did_not_run: 0,
        }
    }
}

impl Rollup {
    fn add_child(&mut self, child: &Outcome) {
        self.time += child.time;
        self.functions_passed += child.functions_passed;
        self.functions_failed += child.functions_failed;
        self.functions_did_not_run += child.functions_did_not_run;

        match child.passed {
            Some(true) => {}
            Some(false) => self.all_passed = false,
            None => self.all_ran = false,
        }
    }

    fn apply(self, outcome: &mut Outcome, fail_status: TestStatus) {
        outcome.time = self.time;
        outcome.functions_passed = self.functions_passed;
        outcome.functions_failed = self.functions_failed;
        outcome.functions_did_not_run = self.functions_did_not_run;

        if self.all_ran {
            outcome.passed = Some(self.all_passed);
            outcome.status = if self.all_passed {
                TestStatus::Idle
            } else {
                fail_status
            };
        } else {
            outcome.passed = None;
            outcome.status = TestStatus::Unknown;
        }
    }
}
