//! Sitekit - static site asset pipeline
//!
//! This library provides functionality to:
//! - Compile Sass stylesheets to expanded and minified CSS
//! - Minify JavaScript and re-indent HTML
//! - Compress images
//! - Watch source trees and serve a live-reloading preview

pub mod cli;
pub mod config;
pub mod server;
pub mod tasks;
pub mod watch;
