//! Command-line interface definitions for gomod-hold.
//!
//! This module defines the CLI structure using clap, including all subcommands
//! and their arguments. The main entry point is the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use gomod_hold::cli::{Cli, Commands};
//!
//! let cli = Cli::parse();
//!
//! match cli.command() {
//!     Commands::Sweep => println!("Asking before removing anything"),
//!     Commands::Survey => println!("Listing unused entries"),
//!     Commands::Jettison => println!("Removing unused entries"),
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{HoldError, Result};
use crate::gc::layout::default_cache_dir;
use crate::gc::resolve::Resolution;

/// Main command-line interface for gomod-hold.
///
/// Global options select the manifests and the module cache; the subcommand
/// decides what happens to the unused entries. Without a subcommand the
/// interactive [`Commands::Sweep`] runs.
#[derive(Debug, Parser)]
#[command(
    name = "gomod-hold",
    bin_name = "gomod-hold",
    author,
    version,
    about = "Reclaim disk space held by Go module cache entries no go.mod still needs",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Global options that apply to all gomod-hold commands.
#[derive(Debug, Parser)]
pub struct GlobalOpts {
    /// go.mod file, or directory to search for go.mod files (repeatable)
    #[arg(
        short = 'm',
        long = "modfile",
        global = true,
        value_name = "PATH",
        value_delimiter = ',',
        env = "GOMOD_HOLD_MODFILE"
    )]
    modfiles: Vec<PathBuf>,

    /// Module cache root (defaults to $GOPATH/pkg/mod, then ~/go/pkg/mod)
    #[arg(long, global = true, value_name = "DIR", env = "GOMODCACHE")]
    modcache: Option<PathBuf>,

    /// Only keep what the given go.mod files name directly
    #[arg(long, global = true, env = "GOMOD_HOLD_SHALLOW")]
    shallow: bool,

    /// Parallel workers used for sizing (0 = one per CPU)
    #[arg(
        short,
        long,
        global = true,
        default_value_t = 0,
        env = "GOMOD_HOLD_JOBS"
    )]
    jobs: usize,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "GOMOD_HOLD_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors and requested data
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "GOMOD_HOLD_QUIET"
    )]
    quiet: bool,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// Get the manifest roots, as given
    pub fn modfiles(&self) -> &[PathBuf] {
        &self.modfiles
    }

    /// Get the module cache override
    pub fn modcache(&self) -> Option<&Path> {
        self.modcache.as_deref()
    }

    /// Get the absolute module cache root.
    ///
    /// Falls back to the first `GOPATH` entry, then the home directory, when
    /// neither `--modcache` nor `GOMODCACHE` is set.
    pub fn get_cache_dir(&self) -> Option<PathBuf> {
        let dir = match self.modcache() {
            Some(dir) => dir.to_path_buf(),
            None => default_cache_dir(None, std::env::var_os("GOPATH"), home::home_dir())?,
        };
        Some(normalize_path(dir))
    }

    /// Get the manifest roots as absolute paths
    pub fn get_modfiles(&self) -> Vec<PathBuf> {
        self.modfiles.iter().map(normalize_path).collect()
    }

    pub fn shallow(&self) -> bool {
        self.shallow
    }

    /// Resolution mode selected by `--shallow`
    pub fn resolution(&self) -> Resolution {
        if self.shallow {
            Resolution::Direct
        } else {
            Resolution::Transitive
        }
    }

    /// Get the sizing worker bound
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for constructing `GlobalOpts` programmatically.
#[derive(Debug, Default)]
pub struct GlobalOptsBuilder {
    modfiles: Vec<PathBuf>,
    modcache: Option<PathBuf>,
    shallow: bool,
    jobs: usize,
    verbose: u8,
    quiet: bool,
}

impl GlobalOptsBuilder {
    /// Add a manifest root.
    pub fn modfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.modfiles.push(path.into());
        self
    }

    /// Set the module cache root.
    pub fn modcache(mut self, dir: Option<impl Into<PathBuf>>) -> Self {
        self.modcache = dir.map(Into::into);
        self
    }

    /// Select direct-only resolution.
    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    /// Set the sizing worker bound.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            modfiles: self.modfiles,
            modcache: self.modcache,
            shallow: self.shallow,
            jobs: self.jobs,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command, defaulting to [`Commands::Sweep`]
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Sweep)
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    global_opts: GlobalOptsBuilder,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Add a manifest root
    pub fn modfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_opts = self.global_opts.modfile(path);
        self
    }

    /// Set the module cache root
    pub fn modcache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_opts = self.global_opts.modcache(Some(dir));
        self
    }

    /// Select direct-only resolution
    pub fn shallow(mut self, shallow: bool) -> Self {
        self.global_opts = self.global_opts.shallow(shallow);
        self
    }

    /// Set the sizing worker bound
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.global_opts = self.global_opts.jobs(jobs);
        self
    }

    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.global_opts = self.global_opts.verbose(level);
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.global_opts = self.global_opts.quiet(enabled);
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let global_opts = self.global_opts.build();
        if global_opts.quiet() && global_opts.verbose() > 0 {
            return Err(HoldError::Config(
                "quiet and verbose cannot be combined".to_string(),
            ));
        }

        Ok(Cli {
            global_opts,
            command: self.command,
        })
    }
}

/// Make a `--modcache` or `--modfile` argument absolute and lexically clean.
///
/// Relative paths are joined onto the current directory, `.` is dropped and
/// `..` consumes the preceding component. Symlinks are left unresolved and
/// the path does not have to exist yet, so a missing cache root is reported
/// by [`ModCache::open`](crate::gc::layout::ModCache::open) rather than here.
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    // A vanished working directory leaves the path relative; later I/O
    // reports it.
    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        use std::path::Component;
        match component {
            // `/..` is `/`; a leading `..` has nothing to consume.
            Component::ParentDir => match components.last() {
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                _ => components.push(component),
            },
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}

/// Available gomod-hold subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Report unused entries and ask what to do with them (default)
    ///
    /// Prints how many unused modules were found and how much space they
    /// occupy, then reads one choice from stdin:
    /// - `1` or `r`: remove them
    /// - `2` or `l`: list the paths that would be removed
    /// - anything else: quit without touching the cache
    Sweep,

    /// List every path a removal would delete, without deleting anything
    Survey,

    /// Remove unused entries without asking
    ///
    /// Extracted module directories and downloaded artifacts are deleted,
    /// then each affected module's `@v/list` is rewritten so it only names
    /// versions whose artifacts are still on disk.
    Jettison,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_sweep() {
        let cli = Cli::parse_from(["gomod-hold", "-m", "go.mod"]);
        assert_eq!(cli.command(), &Commands::Sweep);
        assert_eq!(cli.global_opts().modfiles(), [PathBuf::from("go.mod")]);
        assert_eq!(cli.global_opts().resolution(), Resolution::Transitive);
        assert_eq!(cli.global_opts().jobs(), 0);
    }

    #[test]
    fn test_repeated_and_delimited_modfiles() {
        let cli = Cli::parse_from([
            "gomod-hold",
            "survey",
            "--modfile",
            "a/go.mod,b",
            "-m",
            "c",
        ]);
        assert_eq!(cli.command(), &Commands::Survey);
        assert_eq!(
            cli.global_opts().modfiles(),
            [
                PathBuf::from("a/go.mod"),
                PathBuf::from("b"),
                PathBuf::from("c")
            ]
        );
        assert!(
            cli.global_opts()
                .get_modfiles()
                .iter()
                .all(|p| p.is_absolute())
        );
    }

    #[test]
    fn test_global_flag_positioning() {
        let cli = Cli::parse_from(["gomod-hold", "jettison", "-vv", "--shallow", "-j", "4"]);
        assert_eq!(cli.command(), &Commands::Jettison);
        assert_eq!(cli.global_opts().verbose(), 2);
        assert_eq!(cli.global_opts().resolution(), Resolution::Direct);
        assert_eq!(cli.global_opts().jobs(), 4);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["gomod-hold", "-q", "-v", "-m", "go.mod"]);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_modcache_is_normalized() {
        let cli = Cli::parse_from(["gomod-hold", "--modcache", "/tmp/gopath/./pkg/../pkg/mod"]);
        assert_eq!(
            cli.global_opts().get_cache_dir(),
            Some(PathBuf::from("/tmp/gopath/pkg/mod"))
        );
    }

    #[test]
    fn test_cli_builder() {
        let cli = Cli::builder()
            .modfile("project/go.mod")
            .modcache("/cache")
            .shallow(true)
            .jobs(2)
            .verbose(1)
            .command(Commands::Survey)
            .build()
            .expect("Failed to build CLI");

        assert_eq!(cli.global_opts().modcache(), Some(Path::new("/cache")));
        assert_eq!(cli.global_opts().resolution(), Resolution::Direct);
        assert_eq!(cli.global_opts().jobs(), 2);
        assert_eq!(cli.global_opts().verbose(), 1);
        assert_eq!(cli.command(), &Commands::Survey);

        let cli = Cli::builder().build().expect("Failed to build CLI");
        assert_eq!(cli.command(), &Commands::Sweep);

        assert!(Cli::builder().quiet(true).verbose(1).build().is_err());
    }

    #[test]
    fn test_normalize_path() {
        let normalized = normalize_path("./pkg/./mod");
        assert!(normalized.is_absolute());
        assert!(!normalized.to_string_lossy().contains("/./"));

        let normalized = normalize_path("pkg/../other/mod");
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("other/mod"));
        assert!(!normalized.to_string_lossy().contains(".."));

        let abs_path = if cfg!(windows) {
            PathBuf::from("C:\\Users\\test")
        } else {
            PathBuf::from("/home/test")
        };
        assert_eq!(normalize_path(&abs_path), abs_path);
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_path_stops_at_root() {
        assert_eq!(normalize_path("/../go/pkg/mod"), PathBuf::from("/go/pkg/mod"));
        assert_eq!(
            normalize_path("/home/../../go/./pkg/mod/.."),
            PathBuf::from("/go/pkg")
        );
    }
}
