//! Stylesheet pipeline: Sass compilation, vendor prefixing, minification
//!
//! Each `.scss` source compiles to an expanded `.css` and a `.min.css`
//! variant. Both variants are printed from the same normalized stylesheet,
//! so their selectors always match. Sass partials (leading underscore) are
//! folded into their importers and never emitted standalone.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{discover_files, pattern_prefix, TaskContext, TaskError};

/// Error in the stylesheet pipeline
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StyleError {
    /// Sass compilation error
    #[error("Sass error in {}: {}", .file.display(), .message)]
    Compile { file: PathBuf, message: String },
    /// CSS parse error after Sass compilation
    #[error("CSS parse error in {}: {}", .file.display(), .message)]
    Parse { file: PathBuf, message: String },
    /// CSS transform/minification error
    #[error("CSS minify error in {}: {}", .file.display(), .message)]
    Minify { file: PathBuf, message: String },
    /// CSS printing error
    #[error("CSS output error in {}: {}", .file.display(), .message)]
    Print { file: PathBuf, message: String },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a browser version as lightningcss expects (major.minor.patch).
const fn version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor << 8)
}

/// Browser targets driving vendor prefixing and syntax lowering.
fn browser_targets() -> Targets {
    Targets {
        browsers: Some(Browsers {
            chrome: Some(version(90, 0)),
            edge: Some(version(90, 0)),
            firefox: Some(version(88, 0)),
            safari: Some(version(13, 1)),
            ios_saf: Some(version(13, 0)),
            ..Browsers::default()
        }),
        ..Targets::default()
    }
}

/// Run the styles task: compile every Sass source under the configured glob.
///
/// Returns the list of files written to the dist tree.
pub fn run(ctx: &TaskContext) -> Result<Vec<PathBuf>, TaskError> {
    let src_dir = ctx.src_dir();
    let pattern = &ctx.config().styles.sources;
    let styles_root = src_dir.join(pattern_prefix(pattern));
    let out_dir = ctx.dist_dir().join(&ctx.config().styles.out);

    let mut outputs = Vec::new();
    for file in discover_files(&src_dir, pattern)? {
        if is_partial(&file) {
            continue;
        }

        let rel = file.strip_prefix(&styles_root).unwrap_or(&file).to_path_buf();
        let written = compile_one(&file, &styles_root, &out_dir.join(&rel))?;
        outputs.extend(written);
    }

    Ok(outputs)
}

/// Compile a single Sass entry point to expanded and minified CSS.
///
/// `dest` carries the mirrored relative layout; its extension is replaced
/// with `.css` / `.min.css`.
pub fn compile_one(
    file: &Path,
    load_path: &Path,
    dest: &Path,
) -> Result<Vec<PathBuf>, StyleError> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .load_path(load_path);
    let css = grass::from_path(file, &options)
        .map_err(|e| StyleError::Compile { file: file.to_path_buf(), message: e.to_string() })?;

    let targets = browser_targets();

    let mut stylesheet = StyleSheet::parse(&css, ParserOptions::default())
        .map_err(|e| StyleError::Parse { file: file.to_path_buf(), message: e.to_string() })?;

    // Vendor prefixing and rule merging happen here, against the targets
    stylesheet
        .minify(MinifyOptions { targets, ..MinifyOptions::default() })
        .map_err(|e| StyleError::Minify { file: file.to_path_buf(), message: e.to_string() })?;

    let expanded = stylesheet
        .to_css(PrinterOptions { minify: false, targets, ..PrinterOptions::default() })
        .map_err(|e| StyleError::Print { file: file.to_path_buf(), message: e.to_string() })?;
    let minified = stylesheet
        .to_css(PrinterOptions { minify: true, targets, ..PrinterOptions::default() })
        .map_err(|e| StyleError::Print { file: file.to_path_buf(), message: e.to_string() })?;

    let expanded_path = dest.with_extension("css");
    let minified_path = dest.with_extension("min.css");

    if let Some(parent) = expanded_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&expanded_path, expanded.code)?;
    fs::write(&minified_path, minified.code)?;

    Ok(vec![expanded_path, minified_path])
}

/// Sass partials start with an underscore and are only built via imports.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
