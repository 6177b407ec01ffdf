//! Configuration loading and discovery for `sitekit.toml`
//!
//! Provides functions to find, load, and merge configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::schema::SiteConfig;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitekit.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override source directory
    pub src: Option<PathBuf>,
    /// Override output directory
    pub dist: Option<PathBuf>,
    /// Override preview server port
    pub port: Option<u16>,
}

/// Find sitekit.toml by walking up from the current working directory.
///
/// # Returns
/// - `Some(path)` if a sitekit.toml file is found
/// - `None` if no config file is found
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find sitekit.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start
/// directory, useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join("sitekit.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        // Reached the filesystem root without finding a config
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config: SiteConfig = toml::from_str(&content)?;
            Ok(config)
        }
        None => Ok(SiteConfig::default()),
    }
}

/// Apply CLI overrides on top of a loaded configuration.
pub fn merge_cli_overrides(config: &mut SiteConfig, overrides: &CliOverrides) {
    if let Some(src) = &overrides.src {
        config.project.src = src.clone();
    }
    if let Some(dist) = &overrides.dist {
        config.project.dist = dist.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_none_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.project.src, PathBuf::from("src"));
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sitekit.toml");
        fs::write(&path, "[project]\nsrc = \"assets\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.project.src, PathBuf::from("assets"));
        assert_eq!(config.project.dist, PathBuf::from("dist"));
    }

    #[test]
    fn test_load_config_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sitekit.toml");
        fs::write(&path, "[project\nsrc = ").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sitekit.toml"), "").unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_from(nested).unwrap();
        assert_eq!(found, temp.path().join("sitekit.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a");
        fs::create_dir_all(&nested).unwrap();

        // No sitekit.toml anywhere under the temp root; the walk may still
        // escape into the real filesystem, so only assert when it stays inside.
        if let Some(found) = find_config_from(nested) {
            assert!(!found.starts_with(temp.path()));
        }
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = SiteConfig::default();
        let overrides = CliOverrides {
            src: Some(PathBuf::from("web/src")),
            dist: None,
            port: Some(9000),
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.project.src, PathBuf::from("web/src"));
        assert_eq!(config.project.dist, PathBuf::from("dist"));
        assert_eq!(config.server.port, 9000);
    }
}
