//! # gomod-hold CLI
//!
//! Removes Go module cache entries that none of the given `go.mod` files
//! still need.
//!
//! ## Commands
//!
//! - **sweep** (default): report unused entries and prompt to remove or list
//! - **survey**: list every path that would be removed
//! - **jettison**: remove unused entries without prompting
//!
//! ## Quick Start
//!
//! ```bash
//! gomod-hold --modfile ./go.mod
//! ```
//!
//! ## Environment Variables
//!
//! - `GOMOD_HOLD_MODFILE`: Comma-separated go.mod files or directories
//! - `GOMODCACHE`: Module cache root (otherwise derived from `GOPATH`)
//! - `GOMOD_HOLD_SHALLOW`: Only keep what the roots require directly
//! - `GOMOD_HOLD_JOBS`: Sizing worker count
//! - `GOMOD_HOLD_VERBOSE`: Enable verbose output
//! - `GOMOD_HOLD_QUIET`: Silence all output except errors and data

use std::io::IsTerminal;

use clap::Parser;
use gomod_hold::cli::Cli;

fn main() -> miette::Result<()> {
    miette::set_panic_hook();

    // Plain, context-free reports when stderr is not a terminal (CI, logs).
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse();

    gomod_hold::commands::execute(&cli).map_err(Into::into)
}
