//! Test lifecycle: discovery and execution as cancellable operations.

mod error;

pub use error::ManagerError;

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{
    DEFAULT_VIEW_OUTPUT_LABEL, DISCOVERY_ERRORS_MESSAGE, DISCOVERY_ERROR_BANNER_WIDTH,
    DISCOVERY_FAILED_CONTINUING_MESSAGE,
};
use crate::model::{RunTarget, TestStatus, Tests, TestsToRun};
use crate::notify::{LogNotifier, NotificationAction, Notifier};
use crate::output::OutputChannel;
use crate::provider::{DiscoveryProvider, ProviderError, RunProvider};
use crate::registry::{InMemoryRegistry, TestRegistry};
use crate::results::{reset_test_results, update_results};
use crate::selector::TestSelector;

type PendingDiscovery = Shared<BoxFuture<'static, Result<Tests, ManagerError>>>;

/// Owns discovery and execution for one test root.
///
/// Cheap to clone; clones share the same state. Discovery is single-flight:
/// callers arriving while one is in flight await the same operation.
#[derive(Clone)]
pub struct TestManager {
    inner: Arc<Inner>,
}

struct Inner {
    discovery: Arc<dyn DiscoveryProvider>,
    runner: Arc<dyn RunProvider>,
    registry: Arc<dyn TestRegistry>,
    notifier: Arc<dyn Notifier>,
    output: OutputChannel,
    view_output: NotificationAction,
    state: Mutex<ManagerState>,
    /// Held for the whole run so the run provider can mutate the tree.
    tests: tokio::sync::Mutex<Option<Tests>>,
}

#[derive(Default)]
struct ManagerState {
    status: TestStatus,
    discovery_scope: Option<CancellationToken>,
    run_scope: Option<CancellationToken>,
    pending_discovery: Option<PendingDiscovery>,
}

/// Assembles a [`TestManager`] from its collaborators.
pub struct TestManagerBuilder {
    discovery: Arc<dyn DiscoveryProvider>,
    runner: Arc<dyn RunProvider>,
    registry: Option<Arc<dyn TestRegistry>>,
    notifier: Option<Arc<dyn Notifier>>,
    output: Option<OutputChannel>,
    view_output_label: String,
}

impl TestManagerBuilder {
    /// Publishes discoveries into `registry` instead of a private one.
    pub fn registry(mut self, registry: Arc<dyn TestRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn output(mut self, output: OutputChannel) -> Self {
        self.output = Some(output);
        self
    }

    pub fn view_output_label(mut self, label: impl Into<String>) -> Self {
        self.view_output_label = label.into();
        self
    }

    pub fn build(self) -> TestManager {
        TestManager {
            inner: Arc::new(Inner {
                discovery: self.discovery,
                runner: self.runner,
                registry: self
                    .registry
                    .unwrap_or_else(|| Arc::new(InMemoryRegistry::new())),
                notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
                output: self.output.unwrap_or_default(),
                view_output: NotificationAction::ViewOutput {
                    label: self.view_output_label,
                },
                state: Mutex::new(ManagerState::default()),
                tests: tokio::sync::Mutex::new(None),
            }),
        }
    }
}

impl TestManager {
    /// Creates a manager with in-memory registry, log notifier and a
    /// buffered output channel.
    pub fn new(discovery: Arc<dyn DiscoveryProvider>, runner: Arc<dyn RunProvider>) -> Self {
        Self::builder(discovery, runner).build()
    }

    pub fn builder(
        discovery: Arc<dyn DiscoveryProvider>,
        runner: Arc<dyn RunProvider>,
    ) -> TestManagerBuilder {
        TestManagerBuilder {
            discovery,
            runner,
            registry: None,
            notifier: None,
            output: None,
            view_output_label: DEFAULT_VIEW_OUTPUT_LABEL.to_string(),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> TestStatus {
        self.inner.state.lock().status
    }

    /// The last successfully published inventory.
    pub fn discovered_tests(&self) -> Option<Arc<Tests>> {
        self.inner.registry.get()
    }

    /// A selector reading from this manager's registry.
    pub fn selector(&self) -> TestSelector {
        TestSelector::new(Arc::clone(&self.inner.registry))
    }

    pub fn resolve_value_as_test_to_run(&self, name: &str) -> Option<TestsToRun> {
        self.selector().resolve_value_as_test_to_run(name)
    }

    pub fn output(&self) -> &OutputChannel {
        &self.inner.output
    }

    /// Forwards a chunk of streamed runner output to the output channel.
    pub fn std_out(&self, chunk: &str) {
        self.inner.output.std_out(chunk);
    }

    /// A copy of the cached inventory, if one exists.
    pub async fn tests(&self) -> Option<Tests> {
        self.inner.tests.lock().await.clone()
    }

    /// Discovers tests, or returns the cached inventory.
    ///
    /// Joins a discovery that is already in flight instead of starting a new
    /// one. Unless `ignore_cache` is set, a cached non-empty inventory is
    /// returned right away with its results reset.
    ///
    /// The discovery runs as its own task, so it settles even if every caller
    /// drops its future. Must be called from within a tokio runtime.
    pub async fn discover_tests(&self, ignore_cache: bool) -> Result<Tests, ManagerError> {
        let pending = {
            let mut state = self.inner.state.lock();
            match &state.pending_discovery {
                Some(pending) => {
                    debug!("Joining in-flight test discovery");
                    pending.clone()
                }
                None => {
                    let pending = spawn_discovery(&self.inner, ignore_cache);
                    state.pending_discovery = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Runs tests and returns the inventory with fresh results.
    ///
    /// Results are reset first. A failed discovery does not abort the run:
    /// the user is notified and the run provider gets an empty inventory.
    /// This includes a discovery that was cancelled on its own while the run
    /// itself was not stopped.
    pub async fn run_test(&self, target: RunTarget) -> Result<Tests, ManagerError> {
        self.reset_test_results().await;

        let cancel = {
            let mut state = self.inner.state.lock();
            state.status = TestStatus::Running;
            let token = CancellationToken::new();
            state.run_scope = Some(token.clone());
            token
        };
        info!(
            failed_only = target.run_failed_only(),
            selection = target.selection().is_some(),
            "Running tests"
        );

        let discovered = match self.discover_tests(false).await {
            Ok(_) => true,
            Err(_) if cancel.is_cancelled() => {
                let mut state = self.inner.state.lock();
                state.run_scope = None;
                state.status = TestStatus::Idle;
                warn!("Test run cancelled during discovery");
                return Err(ManagerError::Cancelled);
            }
            Err(err) => {
                warn!(error = %err, "Continuing test run without discovered tests");
                self.inner
                    .notifier
                    .show_error(DISCOVERY_FAILED_CONTINUING_MESSAGE, Some(&self.inner.view_output));
                false
            }
        };

        let mut cached = self.inner.tests.lock().await;
        let mut placeholder = Tests::empty();
        let tests = match cached.as_mut() {
            Some(tests) if discovered => tests,
            _ => &mut placeholder,
        };

        let result = if cancel.is_cancelled() {
            Err(ProviderError::Cancelled)
        } else {
            self.inner
                .runner
                .run(tests, target.selection(), target.run_failed_only(), cancel.clone())
                .await
        };

        match result {
            Ok(()) => {
                update_results(tests);
                let snapshot = tests.clone();
                drop(cached);

                let mut state = self.inner.state.lock();
                state.status = TestStatus::Idle;
                state.run_scope = None;
                info!(
                    passed = snapshot.summary.passed,
                    failures = snapshot.summary.failures,
                    errors = snapshot.summary.errors,
                    skipped = snapshot.summary.skipped,
                    "Test run complete"
                );
                Ok(snapshot)
            }
            Err(err) => {
                drop(cached);

                let mut state = self.inner.state.lock();
                state.run_scope = None;
                if is_cancellation(&err, &cancel) {
                    warn!("Test run cancelled");
                    state.status = TestStatus::Idle;
                    Err(ManagerError::Cancelled)
                } else {
                    error!(error = %err, "Test run failed");
                    state.status = TestStatus::Error;
                    Err(ManagerError::Run(err))
                }
            }
        }
    }

    /// Requests cancellation of whatever is in flight. No-op when idle.
    pub fn stop(&self) {
        let state = self.inner.state.lock();
        for scope in [&state.discovery_scope, &state.run_scope].into_iter().flatten() {
            scope.cancel();
        }
    }

    /// Drops the cached inventory and returns to `Unknown`.
    pub async fn reset(&self) {
        *self.inner.tests.lock().await = None;
        self.inner.state.lock().status = TestStatus::Unknown;
    }

    /// Clears all result fields of the cached inventory.
    pub async fn reset_test_results(&self) {
        if let Some(tests) = self.inner.tests.lock().await.as_mut() {
            reset_test_results(tests);
        }
    }
}

impl Inner {
    async fn discover(self: Arc<Self>, ignore_cache: bool) -> Result<Tests, ManagerError> {
        if !ignore_cache {
            let cached = match self.tests.lock().await.as_mut() {
                Some(tests) if !tests.is_empty() => {
                    reset_test_results(tests);
                    Some(tests.clone())
                }
                _ => None,
            };

            if let Some(snapshot) = cached {
                let mut state = self.state.lock();
                state.pending_discovery = None;
                if state.status != TestStatus::Running {
                    state.status = TestStatus::Idle;
                }
                debug!("Using cached test discovery");
                return Ok(snapshot);
            }
        }

        let cancel = {
            let mut state = self.state.lock();
            if state.status != TestStatus::Running {
                state.status = TestStatus::Discovering;
            }
            let token = match &state.run_scope {
                Some(run) => run.child_token(),
                None => CancellationToken::new(),
            };
            state.discovery_scope = Some(token.clone());
            token
        };
        info!("Discovering tests");

        let result = if cancel.is_cancelled() {
            Err(ProviderError::Cancelled)
        } else {
            self.discovery.discover(cancel.clone()).await
        };

        match result {
            Ok(tests) => Ok(self.discovery_succeeded(tests).await),
            Err(err) => Err(self.discovery_failed(err, &cancel).await),
        }
    }

    async fn discovery_succeeded(&self, mut tests: Tests) -> Tests {
        reset_test_results(&mut tests);
        let snapshot = tests.clone();
        *self.tests.lock().await = Some(tests);

        self.report_discovery_errors(&snapshot);
        self.registry.set(Arc::new(snapshot.clone()));

        {
            let mut state = self.state.lock();
            if state.status == TestStatus::Discovering {
                state.status = TestStatus::Idle;
            }
            state.pending_discovery = None;
            state.discovery_scope = None;
        }

        info!(
            files = snapshot.files.len(),
            functions = snapshot.test_functions().len(),
            "Test discovery complete"
        );
        snapshot
    }

    async fn discovery_failed(&self, err: ProviderError, cancel: &CancellationToken) -> ManagerError {
        *self.tests.lock().await = None;
        self.registry.clear();

        let mut state = self.state.lock();
        state.pending_discovery = None;
        state.discovery_scope = None;

        if is_cancellation(&err, cancel) {
            warn!("Test discovery cancelled");
            if state.status == TestStatus::Discovering {
                state.status = TestStatus::Idle;
            }
            return ManagerError::Cancelled;
        }

        if state.status == TestStatus::Discovering {
            state.status = TestStatus::Error;
        }
        drop(state);

        error!(error = %err, "Test discovery failed");
        self.output.append_line("Test discovery failed: ");
        self.output.append_line(&err.to_string());
        ManagerError::Discovery(err)
    }

    /// Writes per-file discovery errors to the output and raises a single
    /// notification for the whole batch.
    fn report_discovery_errors(&self, tests: &Tests) {
        let banner = "#".repeat(DISCOVERY_ERROR_BANNER_WIDTH);
        let mut have_errors = false;

        for (_, file) in tests.test_files() {
            let Some(errors) = file.errors_when_discovering.as_deref().filter(|e| !e.is_empty())
            else {
                continue;
            };
            have_errors = true;
            warn!(file = %file.name_to_run, "Errors while discovering tests");

            self.output.append_line("");
            self.output.append(&banner);
            self.output.append(&format!(
                "There was an error in identifying tests in {}",
                file.name_to_run
            ));
            self.output.append_line(&banner);
            self.output.append_line(errors);
        }

        if have_errors {
            self.notifier
                .show_error(DISCOVERY_ERRORS_MESSAGE, Some(&self.view_output));
        }
    }
}

/// Spawns `Inner::discover` and wraps its handle in a shareable future.
///
/// The shared future only keeps a weak handle on the manager, so storing it
/// in the manager state does not form a cycle.
fn spawn_discovery(inner: &Arc<Inner>, ignore_cache: bool) -> PendingDiscovery {
    let task = tokio::spawn(Arc::clone(inner).discover(ignore_cache));
    let manager = Arc::downgrade(inner);

    async move {
        match task.await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "Test discovery task aborted");
                if let Some(inner) = manager.upgrade() {
                    let mut state = inner.state.lock();
                    state.pending_discovery = None;
                    state.discovery_scope = None;
                    if state.status == TestStatus::Discovering {
                        state.status = TestStatus::Error;
                    }
                }
                Err(ManagerError::Discovery(ProviderError::Other(err.to_string())))
            }
        }
    }
    .boxed()
    .shared()
}

fn is_cancellation(err: &ProviderError, cancel: &CancellationToken) -> bool {
    cancel.is_cancelled() || matches!(err, ProviderError::Cancelled)
}
