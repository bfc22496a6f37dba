use thiserror::Error;

use crate::provider::ProviderError;

/// Errors returned by [`TestManager`](super::TestManager) operations.
///
/// Cloneable so every caller joined onto one discovery receives the same
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// The operation was stopped by the user; not a failure.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Test discovery failed: {0}")]
    Discovery(ProviderError),

    #[error("Test run failed: {0}")]
    Run(ProviderError),
}

impl ManagerError {
    /// Returns true for the cancellation sentinel.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ManagerError::Cancelled)
    }
}
