//! Contracts for the external collaborators that discover and run tests.
//!
//! A framework integration is a pair of values implementing
//! [`DiscoveryProvider`] and [`RunProvider`]; the manager owns the lifecycle
//! around them.

mod error;
mod manifest;

pub use error::ProviderError;
pub use manifest::{ManifestDiscovery, RecordedResult, ResultsFileRunner};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::model::{Tests, TestsToRun};

/// Produces a fully built inventory.
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Discovers tests. Per-file problems belong in
    /// `errors_when_discovering`; an `Err` means discovery as a whole failed.
    ///
    /// `cancel` is advisory: check it and bail out early when set.
    async fn discover(&self, cancel: CancellationToken) -> Result<Tests, ProviderError>;
}

/// Executes tests and records leaf results in place.
#[async_trait]
pub trait RunProvider: Send + Sync {
    /// Runs `selection` (everything when `None`), or only previously failed
    /// tests when `run_failed_only` is set, writing `passed`, `time`,
    /// `message`, `traceback` and `status` on the functions it executed.
    async fn run(
        &self,
        tests: &mut Tests,
        selection: Option<&TestsToRun>,
        run_failed_only: bool,
        cancel: CancellationToken,
    ) -> Result<(), ProviderError>;
}
