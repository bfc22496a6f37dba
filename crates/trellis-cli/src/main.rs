mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use trellis_core::{
    Config, ManifestDiscovery, NotificationAction, Notifier, OutputChannel, RunTarget,
    ResultsFileRunner, StdoutSink, TestManager, TreeBuilder,
};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Discover, run and inspect test inventories", long_about = None)]
struct Cli {
    /// Discovery manifest to read instead of the configured one
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Recorded results to read instead of the configured ones
    #[arg(long, global = true)]
    results: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover tests and print the tree
    Discover,
    /// Run tests and print the results
    Run {
        /// Only re-run tests that failed
        #[arg(long, conflicts_with = "name")]
        failed: bool,
        /// Folder, file or function to run
        name: Option<String>,
    },
    /// Show what a name resolves to
    Resolve {
        name: String,
    },
    /// Print the effective configuration
    Config,
}

/// Prints notifications to stderr.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show_error(&self, message: &str, action: Option<&NotificationAction>) {
        match action {
            Some(NotificationAction::ViewOutput { .. }) => {
                eprintln!("error: {} (see output above)", message)
            }
            None => eprintln!("error: {}", message),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), String> {
    if let Commands::Config = cli.command {
        print!("{}", config.to_toml_string());
        return Ok(());
    }

    let manager = build_manager(&cli, &config);

    let stopper = manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop();
        }
    });

    match cli.command {
        Commands::Discover => {
            let tests = manager
                .discover_tests(true)
                .await
                .map_err(|e| e.to_string())?;
            print!("{}", render::tree(&tests));
            println!(
                "{} tests in {} files",
                tests.test_functions().len(),
                tests.test_files().count()
            );
        }
        Commands::Run { failed, name } => {
            let target = match name {
                Some(name) => {
                    manager.discover_tests(false).await.map_err(|e| e.to_string())?;
                    manager
                        .resolve_value_as_test_to_run(&name)
                        .map(RunTarget::Selection)
                        .unwrap_or_default()
                }
                None if failed => RunTarget::Failed,
                None => RunTarget::All,
            };

            let tests = manager.run_test(target).await.map_err(|e| e.to_string())?;
            println!();
            print!("{}", render::tree(&tests));
            println!("{}", render::summary(&tests));
            if tests.summary.failures + tests.summary.errors > 0 {
                return Err("some tests failed".to_string());
            }
        }
        Commands::Resolve { name } => {
            manager.discover_tests(false).await.map_err(|e| e.to_string())?;
            let selection = manager
                .resolve_value_as_test_to_run(&name)
                .ok_or_else(|| "no tests discovered".to_string())?;
            let json = serde_json::to_string_pretty(&selection).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        Commands::Config => {}
    }

    Ok(())
}

fn build_manager(cli: &Cli, config: &Config) -> TestManager {
    let manifest = cli
        .manifest
        .clone()
        .unwrap_or_else(|| config.discovery.manifest_path());
    let results = cli
        .results
        .clone()
        .unwrap_or_else(|| config.run.results_path());
    debug!(manifest = %manifest.display(), results = %results.display(), "Using provider files");

    let output = OutputChannel::new(Arc::new(StdoutSink));
    let discovery = ManifestDiscovery::new(manifest)
        .with_builder(TreeBuilder::new().with_package_separator(&config.tree.package_separator));
    let runner = ResultsFileRunner::new(results).with_output(output.clone());

    TestManager::builder(Arc::new(discovery), Arc::new(runner))
        .notifier(Arc::new(TerminalNotifier))
        .output(output)
        .view_output_label(&config.notifications.view_output_label)
        .build()
}
