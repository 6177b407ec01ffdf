//! Configuration schema types for `sitekit.toml`
//!
//! Defines the structure and defaults for sitekit project configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Source directory containing asset subfolders
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Output directory for built assets
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { src: default_src(), dist: default_dist() }
    }
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

/// Stylesheet pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Glob pattern for Sass sources, relative to the source directory
    #[serde(default = "default_styles_sources")]
    pub sources: String,
    /// Output subfolder under the dist directory
    #[serde(default = "default_styles_out")]
    pub out: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self { sources: default_styles_sources(), out: default_styles_out() }
    }
}

fn default_styles_sources() -> String {
    "scss/**/*.scss".to_string()
}

fn default_styles_out() -> String {
    "css".to_string()
}

/// Script pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Glob pattern for JavaScript sources, relative to the source directory
    #[serde(default = "default_scripts_sources")]
    pub sources: String,
    /// Output subfolder under the dist directory
    #[serde(default = "default_scripts_out")]
    pub out: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self { sources: default_scripts_sources(), out: default_scripts_out() }
    }
}

fn default_scripts_sources() -> String {
    "js/**/*.js".to_string()
}

fn default_scripts_out() -> String {
    "js".to_string()
}

/// Markup pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Glob pattern for HTML sources, relative to the source directory
    #[serde(default = "default_markup_sources")]
    pub sources: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self { sources: default_markup_sources() }
    }
}

fn default_markup_sources() -> String {
    "**/*.html".to_string()
}

/// Image pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Glob pattern for image sources, relative to the source directory
    #[serde(default = "default_images_sources")]
    pub sources: String,
    /// Output subfolder under the dist directory
    #[serde(default = "default_images_out")]
    pub out: String,
    /// JPEG re-encode quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            sources: default_images_sources(),
            out: default_images_out(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_images_sources() -> String {
    "img/**/*".to_string()
}

fn default_images_out() -> String {
    "img".to_string()
}

fn default_jpeg_quality() -> u8 {
    80
}

/// Preview server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce interval for file change events, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear the terminal before each triggered run
    #[serde(default)]
    pub clear_screen: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), clear_screen: false }
    }
}

fn default_debounce_ms() -> u32 {
    100
}

/// Root configuration for a sitekit project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Project directory layout
    #[serde(default)]
    pub project: ProjectConfig,
    /// Stylesheet pipeline
    #[serde(default)]
    pub styles: StylesConfig,
    /// Script pipeline
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Markup pipeline
    #[serde(default)]
    pub markup: MarkupConfig,
    /// Image pipeline
    #[serde(default)]
    pub images: ImagesConfig,
    /// Preview server
    #[serde(default)]
    pub server: ServerConfig,
    /// Watch mode
    #[serde(default)]
    pub watch: WatchConfig,
}
