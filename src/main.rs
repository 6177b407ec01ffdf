//! Sitekit - command-line asset pipeline runner

use std::process::ExitCode;

use sitekit::cli;

fn main() -> ExitCode {
    cli::run()
}
