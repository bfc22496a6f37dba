pub mod builder;
pub mod config;
pub mod manager;
pub mod model;
pub mod notify;
pub mod output;
pub mod provider;
pub mod registry;
pub mod results;
pub mod selector;

pub use builder::{flatten_test_files, DiscoveredFile, DiscoveredFunction, DiscoveredSuite, TreeBuilder};
pub use config::{Config, ConfigError};
pub use manager::{ManagerError, TestManager, TestManagerBuilder};
pub use model::{
    FileId, FlattenedTestFunction, FlattenedTestSuite, FolderId, FunctionId, Outcome, ParentRef,
    RunTarget, Summary, SuiteId, TestFile, TestFolder, TestFunction, TestStatus, TestSuite, Tests,
    TestsToRun,
};
pub use notify::{LogNotifier, NotificationAction, Notifier};
pub use output::{BufferedOutput, OutputChannel, OutputSink, StdoutSink};
pub use provider::{DiscoveryProvider, ManifestDiscovery, ProviderError, RecordedResult, ResultsFileRunner, RunProvider};
pub use registry::{InMemoryRegistry, TestRegistry};
pub use results::{reset_test_results, update_results};
pub use selector::TestSelector;

pub use tokio_util::sync::CancellationToken;
