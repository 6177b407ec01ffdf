//! Task orchestration for the asset pipeline
//!
//! Defines the leaf transformation tasks (styles, scripts, markup, images),
//! the `clean` step, and the `compile` composite that runs every leaf task
//! as an independent parallel pipeline. Each leaf task selects files by
//! glob, pipes them through fixed transformation stages, and writes the
//! results under the dist tree.

pub mod images;
pub mod markup;
pub mod scripts;
pub mod styles;

use glob::glob;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::SiteConfig;

/// Error from a task run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TaskError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Stylesheet pipeline error
    #[error(transparent)]
    Style(#[from] styles::StyleError),
    /// Script pipeline error
    #[error(transparent)]
    Script(#[from] scripts::ScriptError),
    /// Markup pipeline error
    #[error(transparent)]
    Markup(#[from] markup::MarkupError),
    /// Image pipeline error
    #[error(transparent)]
    Image(#[from] images::ImageError),
}

/// A single glob-driven transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafTask {
    /// Sass to expanded + minified CSS
    Styles,
    /// JavaScript minification
    Scripts,
    /// HTML formatting
    Markup,
    /// Image compression
    Images,
}

impl LeafTask {
    /// All leaf tasks, in the order `compile` reports them.
    pub const ALL: [LeafTask; 4] =
        [LeafTask::Styles, LeafTask::Scripts, LeafTask::Markup, LeafTask::Images];
}

impl fmt::Display for LeafTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeafTask::Styles => "styles",
            LeafTask::Scripts => "scripts",
            LeafTask::Markup => "markup",
            LeafTask::Images => "images",
        };
        write!(f, "{}", name)
    }
}

/// Shared context for task execution.
#[derive(Debug, Clone)]
pub struct TaskContext {
    config: SiteConfig,
    project_root: PathBuf,
    verbose: bool,
    jobs: Option<usize>,
}

impl TaskContext {
    /// Create a new task context rooted at a project directory.
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false, jobs: None }
    }

    /// Enable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Limit the number of parallel pipelines for `compile`.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Access the loaded configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Whether verbose output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Resolved source directory.
    pub fn src_dir(&self) -> PathBuf {
        self.resolve(&self.config.project.src)
    }

    /// Resolved output directory.
    pub fn dist_dir(&self) -> PathBuf {
        self.resolve(&self.config.project.dist)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Status of a single task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task succeeded
    Success,
    /// Task failed with error
    Failed(String),
}

impl TaskStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of running a single leaf task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Task that ran
    pub task: LeafTask,
    /// Run status
    pub status: TaskStatus,
    /// Output files produced
    pub outputs: Vec<PathBuf>,
    /// Run duration
    pub duration: Duration,
}

impl TaskReport {
    /// Check if this run succeeded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Discover source files matching a glob pattern.
///
/// The pattern is resolved relative to `base_dir`. Matches are restricted
/// to plain files and returned sorted. Unreadable entries are reported and
/// skipped.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, TaskError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths = glob(&pattern_str)
        .map_err(|e| TaskError::InvalidPattern { pattern: pattern.to_string(), source: e })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                eprintln!("Warning: error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Static directory prefix of a glob pattern.
///
/// Used to mirror the layout under a pattern's root into the output tree:
/// `scss/**/*.scss` has prefix `scss`, `**/*.html` has an empty prefix.
pub fn pattern_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in pattern.split('/') {
        if component.contains(['*', '?', '[']) {
            break;
        }
        prefix.push(component);
    }
    prefix
}

/// Run one leaf task, catching any pipeline error into the report.
///
/// Failures are surfaced as console notifications so a surrounding watch
/// loop keeps running.
pub fn run_leaf(ctx: &TaskContext, task: LeafTask) -> TaskReport {
    let start = Instant::now();
    let result = match task {
        LeafTask::Styles => styles::run(ctx),
        LeafTask::Scripts => scripts::run(ctx),
        LeafTask::Markup => markup::run(ctx),
        LeafTask::Images => images::run(ctx),
    };
    let duration = start.elapsed();

    match result {
        Ok(outputs) => {
            println!(
                "[{}] {} complete ({}) - {} file{}",
                timestamp(),
                task,
                format_duration(duration),
                outputs.len(),
                if outputs.len() == 1 { "" } else { "s" }
            );
            TaskReport { task, status: TaskStatus::Success, outputs, duration }
        }
        Err(e) => {
            notify_failure(task, &e);
            TaskReport { task, status: TaskStatus::Failed(e.to_string()), outputs: vec![], duration }
        }
    }
}

/// Run all leaf tasks as independent parallel pipelines.
///
/// A failing pipeline never aborts its siblings; every task produces a
/// report.
pub fn run_compile(ctx: &TaskContext) -> Result<Vec<TaskReport>, TaskError> {
    fs::create_dir_all(ctx.dist_dir())?;

    if ctx.is_verbose() {
        let names: Vec<_> = LeafTask::ALL.iter().map(LeafTask::to_string).collect();
        println!("Compile: {} pipelines in parallel: {:?}", LeafTask::ALL.len(), names);
    }

    let reports = match ctx.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs.max(1))
                .build()
                .map_err(|e| TaskError::Io(std::io::Error::other(e.to_string())))?;
            pool.install(|| LeafTask::ALL.par_iter().map(|task| run_leaf(ctx, *task)).collect())
        }
        None => LeafTask::ALL.par_iter().map(|task| run_leaf(ctx, *task)).collect(),
    };

    Ok(reports)
}

/// Remove the output tree.
///
/// A missing tree is fine; a removal failure is fatal to this step only.
pub fn clean(ctx: &TaskContext) -> Result<(), TaskError> {
    let dist = ctx.dist_dir();
    if dist.exists() {
        fs::remove_dir_all(&dist)?;
    }
    if ctx.is_verbose() {
        println!("Cleaned {}", dist.display());
    }
    Ok(())
}

/// Report a non-fatal task failure to the operator.
pub fn notify_failure(task: LeafTask, error: &TaskError) {
    eprintln!("[{}] Error in {}: {}", timestamp(), task, error);
}

/// Get current timestamp for logging
pub(crate) fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format duration for display
pub(crate) fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
