//! Error types for gomod-hold.
//!
//! This module defines all error types used throughout gomod-hold, using
//! a combination of `thiserror` for ergonomic error definitions and `miette`
//! for rich diagnostic output.
//!
//! # Error Handling Strategy
//!
//! - All errors derive from [`HoldError`]
//! - Each variant includes a diagnostic code and, where it helps, a hint
//! - Scan, resolve, size and remove failures are terminal for their
//!   operation; only version index rewrites are logged and skipped
//! - Errors are automatically converted to `miette::Result` for CLI output
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use gomod_hold::error::{HoldError, Result};
//!
//! fn check_cache(path: &Path) -> Result<()> {
//!     if !path.is_dir() {
//!         return Err(HoldError::CacheNotFound(path.to_path_buf()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Error types that can occur in gomod-hold operations
#[derive(Error, Debug, Diagnostic)]
pub enum HoldError {
    /// The module cache root does not exist or is not a directory.
    ///
    /// Raised before any scanning starts. The cache root is taken from
    /// `--modcache`, `GOMODCACHE`, or derived from `GOPATH`.
    #[error("Go module cache not found at '{0}'")]
    #[diagnostic(
        code(gomod_hold::cache::not_found),
        help("Pass --modcache or set GOMODCACHE to the directory `go env GOMODCACHE` prints.")
    )]
    CacheNotFound(
        /// The path that was expected to hold the module cache
        PathBuf,
    ),

    /// File system I/O error outside of a directory walk.
    ///
    /// Covers reading manifests, statting artifact files, listing a
    /// module's `@v` directory and reading from the prompt.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(gomod_hold::io_error))]
    Io {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A directory walk failed part way through.
    ///
    /// Scans never return a partial inventory, so this aborts the run.
    #[error("Failed to walk '{path}'")]
    #[diagnostic(
        code(gomod_hold::scan::traversal),
        help("Check that the module cache is readable by the current user.")
    )]
    Traversal {
        /// The entry being visited when the walk failed
        path: PathBuf,
        /// The underlying walkdir error
        #[source]
        source: walkdir::Error,
    },

    /// A cache path contains bytes that are not valid UTF-8.
    ///
    /// Module paths and versions are always ASCII once escaped, so such a
    /// path cannot belong to a cache entry.
    #[error("Invalid UTF-8 in path: {0}")]
    #[diagnostic(code(gomod_hold::path::invalid_utf8))]
    InvalidUtf8Path(
        /// The path containing invalid UTF-8
        PathBuf,
    ),

    /// A `go.mod` file could not be parsed.
    ///
    /// Resolution stops at the first malformed manifest: an incomplete
    /// in-use set would make removal unsafe.
    #[error("Failed to parse '{path}': {message}")]
    #[diagnostic(
        code(gomod_hold::modfile::syntax),
        help("Fix the go.mod file or drop it from --modfile; nothing is removed until it parses.")
    )]
    ModfileSyntax {
        /// The manifest that failed to parse
        path: PathBuf,
        /// Description of the syntax problem
        message: String,
        /// Full manifest text, for rendering the offending line
        #[source_code]
        src: NamedSource<String>,
        /// Location of the offending token
        #[label("here")]
        span: SourceSpan,
    },

    /// A string could not be split into a module path and a version.
    #[error("Invalid module coordinate '{input}': {reason}")]
    #[diagnostic(code(gomod_hold::coordinate::invalid))]
    InvalidCoordinate {
        /// The offending input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// One or more size computations failed.
    ///
    /// Every task runs to completion; when any of them fails the byte total
    /// is discarded and all failures are reported together.
    #[error("Failed to size unused cache entries ({failed} failed)")]
    #[diagnostic(
        code(gomod_hold::size::failed),
        help("Nothing has been removed. Re-run once the listed paths are readable.")
    )]
    SizeAggregation {
        /// Number of failed tasks
        failed: usize,
        /// The individual task failures
        #[related]
        errors: Vec<HoldError>,
    },

    /// Deleting a cache entry (or one of its files) failed.
    ///
    /// Removal stops at the first failure so that no later entry is reported
    /// as removed when an earlier one was not.
    #[error("Failed to remove '{path}'")]
    #[diagnostic(
        code(gomod_hold::remove::failed),
        help("The module cache is usually read-only; check ownership of the cache directory.")
    )]
    Remove {
        /// The path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Rewriting a module's version index (`@v/list`) failed.
    ///
    /// Only ever logged: by the time indexes are rewritten the deletions
    /// have already happened.
    #[error("Failed to rewrite version list for '{module}'")]
    #[diagnostic(code(gomod_hold::index::rewrite_failed))]
    IndexRewrite {
        /// Module path whose index could not be rewritten
        module: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool used for sizing could not be created.
    #[error("Failed to start the sizing worker pool")]
    #[diagnostic(code(gomod_hold::size::thread_pool))]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Required configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(gomod_hold::config::error),
        help("Check the required configuration parameters.")
    )]
    Config(
        /// Description of the configuration error
        String,
    ),
}

impl HoldError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn traversal(source: walkdir::Error) -> Self {
        Self::Traversal {
            path: source.path().map(PathBuf::from).unwrap_or_default(),
            source,
        }
    }
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, HoldError>;
