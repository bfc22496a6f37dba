//! Default values for Trellis configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Discovery Defaults
// ============================================================================

/// Default discovery manifest consumed by the manifest provider.
pub const DEFAULT_MANIFEST_FILE: &str = ".trellis/discovered.json";

// ============================================================================
// Run Defaults
// ============================================================================

/// Default recorded-results file consumed by the results runner.
pub const DEFAULT_RESULTS_FILE: &str = ".trellis/results.json";

// ============================================================================
// Tree Defaults
// ============================================================================

/// Separator used when deriving package names from file paths.
pub const DEFAULT_PACKAGE_SEPARATOR: &str = ".";

// ============================================================================
// Notification Defaults
// ============================================================================

/// Label of the "view output" follow-up action.
pub const DEFAULT_VIEW_OUTPUT_LABEL: &str = "View Test Output";

/// Shown once when one or more files failed to parse during discovery.
pub const DISCOVERY_ERRORS_MESSAGE: &str = "There were some errors in discovering tests";

/// Shown when a run falls back to an empty inventory.
pub const DISCOVERY_FAILED_CONTINUING_MESSAGE: &str =
    "Errors in discovering tests, continuing with tests";

/// Width of the `#` banner around per-file discovery errors.
pub const DISCOVERY_ERROR_BANNER_WIDTH: usize = 10;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default tracing filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Project-local config file name.
pub const DEFAULT_CONFIG_FILE: &str = "trellis.toml";
