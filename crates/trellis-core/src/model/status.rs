use serde::{Deserialize, Serialize};

/// Status shared by the test manager and every node of the inventory.
///
/// The manager moves through:
/// Unknown → Discovering → Idle → Running → Idle (→ Error on failure)
///
/// Nodes use the same enum for their results. Files and suites that did not
/// fully pass end in `Error`, folders end in `Fail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    /// Nothing known yet, or a result that has not been produced
    #[default]
    Unknown,
    /// Discovery is in flight
    Discovering,
    /// Ready; also the "passed" terminal state of a container rollup
    Idle,
    /// A run is in flight
    Running,
    /// A folder with at least one failing descendant, or a failed function
    Fail,
    /// A file or suite with at least one failing descendant, or an errored function
    Error,
    /// A function the runner skipped
    Skipped,
    /// A function that passed
    Pass,
}

impl TestStatus {
    /// Returns true while an asynchronous operation owns the manager.
    pub fn is_busy(&self) -> bool {
        matches!(self, TestStatus::Discovering | TestStatus::Running)
    }

    /// Returns a human-readable name for the status.
    pub fn display_name(&self) -> &'static str {
        match self {
            TestStatus::Unknown => "Unknown",
            TestStatus::Discovering => "Discovering",
            TestStatus::Idle => "Idle",
            TestStatus::Running => "Running",
            TestStatus::Fail => "Fail",
            TestStatus::Error => "Error",
            TestStatus::Skipped => "Skipped",
            TestStatus::Pass => "Pass",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(TestStatus::default(), TestStatus::Unknown);
    }

    #[test]
    fn test_busy_states() {
        assert!(TestStatus::Discovering.is_busy());
        assert!(TestStatus::Running.is_busy());
        assert!(!TestStatus::Idle.is_busy());
        assert!(!TestStatus::Error.is_busy());
    }
}
