//! Command-line interface implementation
//!
//! Parses the task name and option overrides, loads project configuration,
//! and dispatches to the task orchestrator, watch dispatcher, and preview
//! server.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast;

use crate::config::{find_config, load_config, merge_cli_overrides, CliOverrides};
use crate::server;
use crate::tasks::{self, LeafTask, TaskContext};
use crate::watch;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Named pipeline tasks invokable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    /// Clean dist, compile everything, then watch and serve
    Default,
    /// Run all leaf tasks in parallel
    Compile,
    /// Serve the preview and rerun tasks on source changes
    Watch,
    /// Remove the dist tree
    Clean,
    /// Compile Sass to expanded and minified CSS
    Styles,
    /// Minify JavaScript
    Scripts,
    /// Format HTML
    Markup,
    /// Compress images
    Images,
}

impl fmt::Display for TaskArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskArg::Default => "default",
            TaskArg::Compile => "compile",
            TaskArg::Watch => "watch",
            TaskArg::Clean => "clean",
            TaskArg::Styles => "styles",
            TaskArg::Scripts => "scripts",
            TaskArg::Markup => "markup",
            TaskArg::Images => "images",
        };
        write!(f, "{}", name)
    }
}

/// Sitekit - static site asset pipeline
#[derive(Parser)]
#[command(name = "sitekit")]
#[command(about = "Sitekit - compile, watch, and preview static site assets")]
#[command(version)]
pub struct Cli {
    /// Task to run
    #[arg(value_enum, default_value_t = TaskArg::Default)]
    pub task: TaskArg,

    /// Override the source directory
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Override the output directory
    #[arg(long)]
    pub dist: Option<PathBuf>,

    /// Override the preview server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Number of parallel pipelines for compile
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI entry point.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    init_tracing();

    if cli.jobs == Some(0) {
        eprintln!("Error: --jobs must be at least 1");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    // Find config file path and determine project root
    let (config, project_root) = match find_config() {
        Some(config_path) => {
            if cli.verbose {
                println!("Using config: {}", config_path.display());
            }
            let config = match load_config(Some(&config_path)) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            let root = config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (config, root)
        }
        None => {
            if cli.verbose {
                println!("No sitekit.toml found, using defaults");
            }
            let root = std::env::current_dir().unwrap_or_default();
            (crate::config::SiteConfig::default(), root)
        }
    };

    let mut config = config;
    let overrides = CliOverrides { src: cli.src.clone(), dist: cli.dist.clone(), port: cli.port };
    merge_cli_overrides(&mut config, &overrides);

    let ctx = TaskContext::new(config, project_root)
        .with_verbose(cli.verbose)
        .with_jobs(cli.jobs);

    match cli.task {
        TaskArg::Styles => run_single(&ctx, LeafTask::Styles),
        TaskArg::Scripts => run_single(&ctx, LeafTask::Scripts),
        TaskArg::Markup => run_single(&ctx, LeafTask::Markup),
        TaskArg::Images => run_single(&ctx, LeafTask::Images),
        TaskArg::Clean => match tasks::clean(&ctx) {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        },
        TaskArg::Compile => run_compile(&ctx),
        TaskArg::Watch => run_watch_mode(&ctx, false),
        TaskArg::Default => run_watch_mode(&ctx, true),
    }
}

/// Run one leaf task from the CLI; failure maps to a nonzero exit code.
fn run_single(ctx: &TaskContext, task: LeafTask) -> ExitCode {
    let report = tasks::run_leaf(ctx, task);
    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the compile composite.
fn run_compile(ctx: &TaskContext) -> ExitCode {
    match tasks::run_compile(ctx) {
        Ok(reports) => {
            let failed = reports.iter().filter(|r| !r.is_success()).count();
            if failed == 0 {
                ExitCode::from(EXIT_SUCCESS)
            } else {
                eprintln!("{} of {} pipelines failed", failed, reports.len());
                ExitCode::from(EXIT_ERROR)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Start the preview server and the watch dispatcher.
///
/// With `full`, the dist tree is cleaned, then the initial compile runs on
/// a background thread while the server and watchers come up, so changes
/// saved during the compile are picked up. Task failures are reported but
/// never prevent the watch loop from starting.
fn run_watch_mode(ctx: &TaskContext, full: bool) -> ExitCode {
    if full {
        // Cleanup failure is fatal to the clean step only
        if let Err(e) = tasks::clean(ctx) {
            eprintln!("Error: {}", e);
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let (reload_tx, _keepalive) = broadcast::channel(100);

    let server_config = ctx.config().server.clone();
    let dist_dir = ctx.dist_dir();
    let server_tx = reload_tx.clone();
    runtime.spawn(async move {
        if let Err(e) = server::run_server(server_config, dist_dir, server_tx).await {
            eprintln!("Preview server error: {}", e);
        }
    });

    if full {
        let compile_ctx = ctx.clone();
        std::thread::spawn(move || {
            if let Err(e) = tasks::run_compile(&compile_ctx) {
                eprintln!("Error: {}", e);
            }
        });
    }

    println!("Press Ctrl+C to stop");
    match watch::watch_and_dispatch(ctx, reload_tx) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Initialize the tracing subscriber for server-side logging.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
