//! Project configuration for `sitekit.toml`
//!
//! Configuration is optional: every section has defaults matching the
//! conventional `src/` → `dist/` layout.

pub mod loader;
pub mod schema;

pub use loader::{find_config, find_config_from, load_config, merge_cli_overrides, CliOverrides, ConfigError};
pub use schema::*;
