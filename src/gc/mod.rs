//! Finding and reclaiming stale Go module cache entries.
//!
//! A module cache holds two kinds of entry for each `module@version`:
//! - the extracted source tree at `<root>/<module>@<version>/`
//! - the downloaded artifacts (`.info`, `.mod`, `.zip`, `.ziphash`) in
//!   `<root>/cache/download/<module>/@v/`, next to the module's `list` of
//!   known versions
//!
//! A sweep scans both inventories, resolves which coordinates the given
//! `go.mod` files still need, and treats everything else as unused. Unused
//! entries can be listed, or removed with the version lists rewritten to
//! match what is left on disk.
//!
//! # Features
//!
//! - Case-escaped paths: `github.com/!burnt!sushi` on disk is
//!   `github.com/BurntSushi` everywhere else
//! - Transitive resolution through each dependency's extracted `go.mod`
//! - Parallel sizing: Uses rayon with a bounded worker count
//! - Atomic version list rewrites
//!
//! # Example
//!
//! ```no_run
//! use gomod_hold::gc::config::Sweeper;
//!
//! let sweeper = Sweeper::builder()
//!     .cache_dir("/home/gopher/go/pkg/mod")
//!     .modfile("./go.mod")
//!     .jobs(4)
//!     .build()?;
//!
//! let plan = sweeper.plan()?;
//! println!("{} unused entries", plan.unused_count());
//!
//! let stats = sweeper.remove(&plan)?;
//! println!("Freed {} bytes", stats.bytes_freed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod layout;
pub mod reclaim;
pub mod reconcile;
pub mod resolve;
pub mod scan;
mod size;

pub use size::{format_size, reclaimable_size};
