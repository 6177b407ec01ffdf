//! Script pipeline: JavaScript minification
//!
//! Each `.js` source is minified to a `.min.js` sibling in the dist tree.

use minify_js::{minify, Session, TopLevelMode};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{discover_files, pattern_prefix, TaskContext, TaskError};

/// Error in the script pipeline
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScriptError {
    /// JavaScript syntax or minification error
    #[error("JS minify error in {}: {}", .file.display(), .message)]
    Minify { file: PathBuf, message: String },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the scripts task: minify every JavaScript source under the glob.
///
/// Returns the list of files written to the dist tree.
pub fn run(ctx: &TaskContext) -> Result<Vec<PathBuf>, TaskError> {
    let src_dir = ctx.src_dir();
    let pattern = &ctx.config().scripts.sources;
    let scripts_root = src_dir.join(pattern_prefix(pattern));
    let out_dir = ctx.dist_dir().join(&ctx.config().scripts.out);

    let mut outputs = Vec::new();
    for file in discover_files(&src_dir, pattern)? {
        let rel = file.strip_prefix(&scripts_root).unwrap_or(&file).to_path_buf();
        let dest = out_dir.join(&rel).with_extension("min.js");
        minify_one(&file, &dest)?;
        outputs.push(dest);
    }

    Ok(outputs)
}

/// Minify a single JavaScript file to `dest`.
pub fn minify_one(file: &Path, dest: &Path) -> Result<(), ScriptError> {
    let source = fs::read(file)?;

    let session = Session::new();
    let mut minified = Vec::new();
    minify(&session, TopLevelMode::Global, &source, &mut minified)
        .map_err(|e| ScriptError::Minify { file: file.to_path_buf(), message: format!("{:?}", e) })?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, minified)?;
    Ok(())
}
