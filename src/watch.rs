//! File-watch dispatcher
//!
//! Maps source glob patterns to leaf tasks and reruns them when matching
//! paths change, followed by a reload signal to the preview server. Task
//! failures are reported and never stop the watch loop.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::SiteConfig;
use crate::server::ReloadEvent;
use crate::tasks::{self, LeafTask, TaskContext};

/// Error during watch mode
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(#[source] notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    Channel(String),
    /// Source directory not found
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// A filesystem glob bound to one leaf task.
#[derive(Debug, Clone)]
pub struct WatchRule {
    /// Glob pattern, relative to the source directory
    pub pattern: String,
    /// Task to rerun when a matching path changes
    pub task: LeafTask,
}

/// Watch rules in dispatch order: images, markup, styles, scripts.
pub fn watch_rules(config: &SiteConfig) -> Vec<WatchRule> {
    vec![
        WatchRule { pattern: config.images.sources.clone(), task: LeafTask::Images },
        WatchRule { pattern: config.markup.sources.clone(), task: LeafTask::Markup },
        WatchRule { pattern: config.styles.sources.clone(), task: LeafTask::Styles },
        WatchRule { pattern: config.scripts.sources.clone(), task: LeafTask::Scripts },
    ]
}

/// Tasks triggered by a batch of changed paths, in rule order.
///
/// Each rule fires at most once per batch; a path matching several rules
/// triggers each of them.
pub fn triggered_tasks(rules: &[WatchRule], src_dir: &Path, changed: &[PathBuf]) -> Vec<LeafTask> {
    rules
        .iter()
        .filter(|rule| changed.iter().any(|path| rule_matches(rule, src_dir, path)))
        .map(|rule| rule.task)
        .collect()
}

/// Check whether a changed path matches a watch rule's glob.
fn rule_matches(rule: &WatchRule, src_dir: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(src_dir) else {
        return false;
    };

    glob::Pattern::new(&rule.pattern)
        .map(|pattern| pattern.matches(&relative.to_string_lossy()))
        .unwrap_or(false)
}

/// Watch the source tree and dispatch tasks on changes.
///
/// Blocks until the watch channel closes. Each triggered task runs
/// sequentially and is followed by a reload broadcast to connected preview
/// clients; failures are surfaced as console notifications only.
pub fn watch_and_dispatch(
    ctx: &TaskContext,
    reload_tx: broadcast::Sender<ReloadEvent>,
) -> Result<(), WatchError> {
    let src_dir = ctx.src_dir();
    if !src_dir.exists() {
        return Err(WatchError::SourceNotFound(src_dir));
    }

    let rules = watch_rules(ctx.config());
    let watch_config = ctx.config().watch.clone();

    let (tx, rx) = channel();
    let debounce = Duration::from_millis(u64::from(watch_config.debounce_ms));
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
    debouncer
        .watcher()
        .watch(&src_dir, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    println!("[{}] Watching {} for changes...", tasks::timestamp(), src_dir.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed = changed_paths(&events);
                if changed.is_empty() {
                    continue;
                }

                if watch_config.clear_screen {
                    clear_screen();
                }
                for path in &changed {
                    if let Some(name) = path.file_name() {
                        println!("[{}] Changed: {}", tasks::timestamp(), name.to_string_lossy());
                    }
                }

                for task in triggered_tasks(&rules, &src_dir, &changed) {
                    let _report = tasks::run_leaf(ctx, task);
                    // Reload even after a failed run so the browser picks up
                    // whatever was written before the error
                    let _ = reload_tx.send(ReloadEvent::for_task(task));
                }
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal), keep watching
                eprintln!("[{}] Watch error: {}", tasks::timestamp(), error);
            }
            Err(e) => {
                return Err(WatchError::Channel(e.to_string()));
            }
        }
    }
}

/// Paths from a debounced batch worth dispatching on.
fn changed_paths(events: &[DebouncedEvent]) -> Vec<PathBuf> {
    events
        .iter()
        .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
        .map(|e| e.path.clone())
        .collect()
}

/// Clear the terminal screen
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}
