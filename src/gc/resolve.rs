//! Building the in-use set from root `go.mod` files.
//!
//! In [`Resolution::Transitive`] mode every coordinate found is expanded by
//! reading that module's own `go.mod` from its extracted cache directory. The
//! walk is an explicit worklist: a queue of coordinates still to expand plus
//! the set of manifest paths already parsed. Dependency graphs can be cyclic
//! (replace chains, mutually requiring modules), and a manifest path that has
//! been parsed once is never parsed again.
//!
//! A dependency whose `go.mod` is not extracted in the cache is simply not
//! expanded further. A manifest that fails to parse aborts the whole
//! resolution.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use miette::NamedSource;
use walkdir::WalkDir;

use super::layout::ModCache;
use crate::coordinate::Coordinate;
use crate::error::{HoldError, Result};
use crate::logging::Logger;
use crate::modfile::{MODFILE_NAME, Modfile};

/// How far dependencies are followed from the root manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Follow every dependency's own `go.mod` found in the extracted cache.
    #[default]
    Transitive,
    /// Only what the root manifests name directly.
    Direct,
}

/// Coordinates reachable from the root manifests.
#[derive(Debug, Default, Clone)]
pub struct InUseSet {
    coordinates: HashSet<Coordinate>,
    manifests_parsed: usize,
}

impl InUseSet {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.coordinates.contains(coordinate)
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.coordinates.iter()
    }

    /// Number of distinct `go.mod` files parsed to build this set.
    pub fn manifests_parsed(&self) -> usize {
        self.manifests_parsed
    }
}

impl FromIterator<Coordinate> for InUseSet {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self {
            coordinates: iter.into_iter().collect(),
            manifests_parsed: 0,
        }
    }
}

/// Expand the configured roots into manifest files.
///
/// A file is taken as a manifest whatever its name. A directory is searched
/// recursively for `go.mod` files, skipping hidden directories. Any other
/// path is an error.
pub fn find_modfiles(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut modfiles = Vec::new();

    for root in roots {
        let metadata = fs::metadata(root).map_err(|source| HoldError::io(root, source))?;
        if metadata.is_file() {
            modfiles.push(root.clone());
            continue;
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = entry.map_err(HoldError::traversal)?;
            if entry.file_type().is_file() && entry.file_name() == MODFILE_NAME {
                modfiles.push(entry.into_path());
            }
        }
    }

    Ok(modfiles)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Walks manifests into an [`InUseSet`].
pub struct Resolver<'a> {
    cache: &'a ModCache,
    resolution: Resolution,
    log: Logger,
}

impl<'a> Resolver<'a> {
    pub fn new(cache: &'a ModCache, resolution: Resolution, log: Logger) -> Self {
        Self {
            cache,
            resolution,
            log,
        }
    }

    /// Resolve the in-use set starting from already located manifest files.
    pub fn resolve(&self, modfiles: &[PathBuf]) -> Result<InUseSet> {
        let mut visited: HashSet<PathBuf> = HashSet::with_capacity(modfiles.len() * 8);
        let mut in_use: HashSet<Coordinate> = HashSet::with_capacity(modfiles.len() * 32);
        let mut frontier: VecDeque<Coordinate> = VecDeque::new();

        for path in modfiles {
            if visited.insert(path.clone()) {
                let modfile = parse_modfile(path)?;
                self.log.verbose(
                    2,
                    format!(
                        "Parsed {} ({} requirements)",
                        path.display(),
                        modfile.require.len()
                    ),
                );
                self.collect(&modfile, &mut in_use, &mut frontier);
            }
        }

        if self.resolution == Resolution::Transitive {
            while let Some(coordinate) = frontier.pop_front() {
                let path = self.cache.extracted_modfile(&coordinate);
                if !path.is_file() {
                    self.log.verbose(
                        3,
                        format!("No extracted go.mod for {coordinate}, not expanding"),
                    );
                    continue;
                }
                if !visited.insert(path.clone()) {
                    continue;
                }

                let modfile = parse_modfile(&path)?;
                self.log
                    .verbose(2, format!("Expanded {coordinate} via {}", path.display()));
                self.collect(&modfile, &mut in_use, &mut frontier);
            }
        }

        Ok(InUseSet {
            coordinates: in_use,
            manifests_parsed: visited.len(),
        })
    }

    fn collect(
        &self,
        modfile: &Modfile,
        in_use: &mut HashSet<Coordinate>,
        frontier: &mut VecDeque<Coordinate>,
    ) {
        for coordinate in modfile.coordinates() {
            if in_use.insert(coordinate.clone()) && self.resolution == Resolution::Transitive {
                frontier.push_back(coordinate.clone());
            }
        }
    }
}

/// Read and parse one manifest, turning syntax errors into a diagnostic that
/// points at the offending token.
pub(crate) fn parse_modfile(path: &Path) -> Result<Modfile> {
    let data = fs::read(path).map_err(|source| HoldError::io(path, source))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(MODFILE_NAME);

    Modfile::parse(filename, &data).map_err(|e| HoldError::ModfileSyntax {
        path: path.to_path_buf(),
        message: e.message,
        src: NamedSource::new(
            path.display().to_string(),
            String::from_utf8_lossy(&data).into_owned(),
        ),
        span: (e.offset, e.len).into(),
    })
}
