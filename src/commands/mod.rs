//! Implementation of gomod-hold subcommands.
//!
//! `mod.rs` is a thin dispatcher: it turns the parsed CLI into a
//! [`Sweeper`] and hands it to [`Sweep`], which owns the report, the prompt
//! and the list/remove actions.

use std::io::{self, BufRead, Write};

use crate::cli::Cli;
use crate::error::Result;
use crate::gc::config::Sweeper;
use crate::logging::Logger;

pub(crate) mod sweep;

pub use sweep::{Choice, Sweep};

#[cfg(test)]
mod tests;

/// Execute commands based on the parsed CLI arguments.
///
/// The prompt reads from stdin; listings and reports go to stdout.
pub fn execute(cli: &Cli) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    execute_with_io(cli, stdin.lock(), stdout.lock())
}

/// Execute commands with explicit input and output streams.
pub fn execute_with_io(cli: &Cli, input: impl BufRead, output: impl Write) -> Result<()> {
    let opts = cli.global_opts();
    let quiet = opts.quiet();
    let verbose = if quiet { 0 } else { opts.verbose() };

    let mut builder = Sweeper::builder()
        .modfiles(opts.get_modfiles())
        .resolution(opts.resolution())
        .jobs(opts.jobs())
        .verbose(verbose)
        .quiet(quiet);
    if let Some(cache_dir) = opts.get_cache_dir() {
        builder = builder.cache_dir(cache_dir);
    }
    let sweeper = builder.build()?;

    Sweep::new(&sweeper, Logger::new(verbose, quiet)).run(*cli.command(), input, output)
}
