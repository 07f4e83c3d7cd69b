//! # gomod-hold
//!
//! Reclaims disk space held by Go module cache entries that no `go.mod`
//! still needs.
//!
//! ## Overview
//!
//! The Go module cache only ever grows: every version ever fetched stays
//! behind as an extracted source tree plus its downloaded artifacts. gomod-hold
//! compares what is in the cache against what a set of `go.mod` files (and,
//! by default, the `go.mod` files of their dependencies) still refer to, and
//! removes the rest.
//!
//! ## Key Features
//!
//! - **Both halves of the cache**: extracted `module@version` directories and
//!   the `cache/download/.../@v` artifacts are swept together
//! - **Transitive resolution**: dependencies are followed through their own
//!   extracted `go.mod`; `--shallow` keeps only what the roots name
//! - **Consistent version lists**: each module's `@v/list` is rewritten
//!   atomically to drop exactly the removed versions
//! - **Parallel sizing**: Leverages rayon to size unused entries
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: The sweep prompt and the survey/jettison commands
//! - [`coordinate`]: `module@version` coordinates and the `!` case escaping
//! - [`modfile`]: Lax `go.mod` parsing
//! - [`gc`]: Scanning, resolving, sizing and reclaiming
//! - [`error`]: Error types and handling with thiserror + miette
//!
//! ## Usage
//!
//! ```bash
//! # Ask before removing anything no project under ~/src still needs
//! gomod-hold -m ~/src
//!
//! # Scripted: list, then remove
//! gomod-hold survey -m ./go.mod,./tools/go.mod
//! gomod-hold jettison -m ./go.mod,./tools/go.mod
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use gomod_hold::cli::{Cli, Commands};
//! use gomod_hold::commands;
//!
//! let cli = Cli::builder()
//!     .modfile("go.mod")
//!     .modcache("/home/gopher/go/pkg/mod")
//!     .command(Commands::Survey)
//!     .build()?;
//!
//! commands::execute(&cli)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! The crate uses a combination of:
//! - `thiserror` for strongly-typed errors
//! - `miette` for rich diagnostic output in CLI
//!
//! All public functions return `Result` types with descriptive error variants.

pub mod cli;
pub mod commands;
pub mod coordinate;
pub mod error;
pub mod gc;
pub mod modfile;

mod logging;
