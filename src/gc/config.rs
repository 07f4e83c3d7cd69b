use std::path::{Path, PathBuf};

use super::layout::ModCache;
use super::reclaim::{self, RemovalStats};
use super::reconcile::unused;
use super::resolve::{Resolution, Resolver, find_modfiles};
use super::scan::{scan_downloaded, scan_extracted};
use super::size::{format_size, reclaimable_size};
use crate::coordinate::Coordinate;
use crate::error::{HoldError, Result};
use crate::logging::Logger;

/// Module cache sweeper
#[derive(Debug)]
pub struct Sweeper {
    /// Module cache being swept
    cache: ModCache,
    /// Root `go.mod` files or directories to search for them
    modfiles: Vec<PathBuf>,
    /// How far dependencies are followed
    resolution: Resolution,
    /// Size worker bound (0 = one per CPU)
    jobs: usize,
    log: Logger,
}

impl Sweeper {
    /// Creates a new builder for [`Sweeper`]
    pub fn builder() -> SweeperBuilder {
        SweeperBuilder::default()
    }

    /// Get the module cache root
    pub fn cache_dir(&self) -> &Path {
        self.cache.root()
    }

    /// Get the configured manifest roots
    pub fn modfiles(&self) -> &[PathBuf] {
        &self.modfiles
    }

    /// Get the resolution mode
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Get the size worker bound
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Work out what is unused and how much space it holds.
    ///
    /// Nothing on disk is modified. Fails if the cache cannot be scanned, a
    /// manifest cannot be parsed, or any unused entry cannot be sized.
    pub fn plan(&self) -> Result<Plan> {
        let log = self.log;

        let extracted = scan_extracted(&self.cache)?;
        let downloaded = scan_downloaded(&self.cache)?;
        log.verbose(
            1,
            format!(
                "Scanned {}: {} extracted, {} downloaded",
                self.cache.root().display(),
                extracted.len(),
                downloaded.len()
            ),
        );

        let modfiles = find_modfiles(&self.modfiles)?;
        if modfiles.is_empty() {
            return Err(HoldError::Config(format!(
                "no go.mod files found under {}",
                display_paths(&self.modfiles)
            )));
        }

        let in_use = Resolver::new(&self.cache, self.resolution, log).resolve(&modfiles)?;
        log.verbose(
            1,
            format!(
                "Resolved {} in-use modules from {} go.mod files",
                in_use.len(),
                in_use.manifests_parsed()
            ),
        );

        let unused_extracted = unused(&extracted, &in_use);
        let unused_downloaded = unused(&downloaded, &in_use);

        let reclaimable_bytes = reclaimable_size(
            &self.cache,
            &unused_extracted,
            &unused_downloaded,
            self.jobs,
        )?;
        log.verbose(
            1,
            format!(
                "{} extracted and {} downloaded entries unused ({})",
                unused_extracted.len(),
                unused_downloaded.len(),
                format_size(reclaimable_bytes)
            ),
        );

        Ok(Plan {
            extracted_scanned: extracted.len(),
            downloaded_scanned: downloaded.len(),
            in_use: in_use.len(),
            unused_extracted,
            unused_downloaded,
            reclaimable_bytes,
        })
    }

    /// Every path [`Sweeper::remove`] would delete for `plan`.
    pub fn list(&self, plan: &Plan) -> Result<Vec<PathBuf>> {
        reclaim::list_paths(&self.cache, &plan.unused_extracted, &plan.unused_downloaded)
    }

    /// Delete everything in `plan` and rewrite the affected version indexes.
    pub fn remove(&self, plan: &Plan) -> Result<RemovalStats> {
        let mut stats = reclaim::remove(
            &self.cache,
            &plan.unused_extracted,
            &plan.unused_downloaded,
            self.log,
        )?;
        stats.bytes_freed = plan.reclaimable_bytes;

        self.log.verbose(
            1,
            format!(
                "Removed {} extracted and {} downloaded entries, rewrote {} version lists",
                stats.extracted_removed, stats.downloaded_removed, stats.indexes_rewritten
            ),
        );

        Ok(stats)
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder for [`Sweeper`]
#[derive(Debug, Default)]
pub struct SweeperBuilder {
    cache_dir: Option<PathBuf>,
    modfiles: Vec<PathBuf>,
    resolution: Resolution,
    jobs: usize,
    verbose: u8,
    quiet: bool,
}

impl SweeperBuilder {
    /// Set the module cache root
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the manifest roots
    pub fn modfiles(mut self, paths: Vec<PathBuf>) -> Self {
        self.modfiles = paths;
        self
    }

    /// Add a single manifest root
    pub fn modfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.modfiles.push(path.into());
        self
    }

    /// Set the resolution mode
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the size worker bound (0 = one per CPU)
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the verbosity level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the [`Sweeper`]
    ///
    /// Fails if no manifest root was given, no cache directory was set, or
    /// the cache directory does not exist.
    pub fn build(self) -> Result<Sweeper> {
        if self.modfiles.is_empty() {
            return Err(HoldError::Config(
                "at least one --modfile path is required".to_string(),
            ));
        }

        let cache_dir = self.cache_dir.ok_or_else(|| {
            HoldError::Config(
                "could not determine the module cache directory; pass --modcache".to_string(),
            )
        })?;

        Ok(Sweeper {
            cache: ModCache::open(cache_dir)?,
            modfiles: self.modfiles,
            resolution: self.resolution,
            jobs: self.jobs,
            log: Logger::new(self.verbose, self.quiet),
        })
    }
}

/// What a sweep would remove
#[derive(Debug, Clone, Default)]
pub struct Plan {
    unused_extracted: Vec<Coordinate>,
    unused_downloaded: Vec<Coordinate>,
    reclaimable_bytes: u64,
    extracted_scanned: usize,
    downloaded_scanned: usize,
    in_use: usize,
}

impl Plan {
    /// Unused extracted entries, in scan order
    pub fn unused_extracted(&self) -> &[Coordinate] {
        &self.unused_extracted
    }

    /// Unused downloaded entries, in scan order
    pub fn unused_downloaded(&self) -> &[Coordinate] {
        &self.unused_downloaded
    }

    /// Total size of every unused entry
    pub fn reclaimable_bytes(&self) -> u64 {
        self.reclaimable_bytes
    }

    /// Number of unused entries of either kind
    pub fn unused_count(&self) -> usize {
        self.unused_extracted.len() + self.unused_downloaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unused_count() == 0
    }

    pub fn extracted_scanned(&self) -> usize {
        self.extracted_scanned
    }

    pub fn downloaded_scanned(&self) -> usize {
        self.downloaded_scanned
    }

    /// Size of the in-use set the plan was computed against
    pub fn in_use(&self) -> usize {
        self.in_use
    }
}
