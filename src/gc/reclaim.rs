use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use super::layout::ModCache;
use super::scan::downloaded_files;
use crate::coordinate::Coordinate;
use crate::error::{HoldError, Result};
use crate::logging::Logger;

/// Statistics about a removal pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovalStats {
    /// Extracted module directories removed
    pub extracted_removed: usize,
    /// Downloaded entries whose files were all removed
    pub downloaded_removed: usize,
    /// Individual downloaded artifact files removed
    pub files_removed: usize,
    /// Bytes freed, as measured when the plan was made
    pub bytes_freed: u64,
    /// Version index files rewritten
    pub indexes_rewritten: usize,
    /// Version index files that could not be rewritten
    pub index_failures: usize,
}

/// Outcome of rewriting one module's version index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRewrite {
    /// The module has no `list` file
    Missing,
    Rewritten { kept: usize, dropped: usize },
}

/// Every path [`remove`] would delete, in removal order.
pub fn list_paths(
    cache: &ModCache,
    extracted: &[Coordinate],
    downloaded: &[Coordinate],
) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = extracted.iter().map(|c| cache.extracted_dir(c)).collect();
    for coordinate in downloaded {
        paths.extend(downloaded_files(cache, coordinate)?);
    }
    Ok(paths)
}

/// Delete the given entries, then bring the affected version indexes in line
/// with what is left on disk.
///
/// Extracted directories go first, then the artifact files of each downloaded
/// entry. A downloaded entry with no files left on disk counts as a deletion
/// failure. The first deletion failure stops the pass; indexes are still
/// rewritten for the downloaded entries that were fully removed before it,
/// and then the failure is returned. Index rewrite failures are logged and
/// counted but never fail the pass.
pub fn remove(
    cache: &ModCache,
    extracted: &[Coordinate],
    downloaded: &[Coordinate],
    log: Logger,
) -> Result<RemovalStats> {
    let mut stats = RemovalStats::default();

    for coordinate in extracted {
        let dir = cache.extracted_dir(coordinate);
        log.verbose(2, format!("Removing {}", dir.display()));
        if remove_extracted(&dir)? {
            prune_empty_parents(&dir, cache.root());
        }
        stats.extracted_removed += 1;
    }

    let mut removed: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut failure = None;

    'entries: for coordinate in downloaded {
        let files = match downloaded_files(cache, coordinate) {
            Ok(files) => files,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        if files.is_empty() {
            let stem = cache
                .version_dir(coordinate.module())
                .join(&*coordinate.escaped_version());
            failure = Some(HoldError::Remove {
                path: stem,
                source: ErrorKind::NotFound.into(),
            });
            break;
        }

        for file in files {
            log.verbose(2, format!("Removing {}", file.display()));
            if let Err(source) = fs::remove_file(&file) {
                failure = Some(HoldError::Remove { path: file, source });
                break 'entries;
            }
            stats.files_removed += 1;
        }

        removed
            .entry(coordinate.module())
            .or_default()
            .push(coordinate.version());
        stats.downloaded_removed += 1;
    }

    for (module, versions) in &removed {
        match rewrite_version_index(cache, module, versions) {
            Ok(IndexRewrite::Rewritten { kept, dropped }) => {
                log.verbose(
                    2,
                    format!("Rewrote version list for {module}: kept {kept}, dropped {dropped}"),
                );
                stats.indexes_rewritten += 1;
            }
            Ok(IndexRewrite::Missing) => {}
            Err(e) => {
                let detail = std::error::Error::source(&e)
                    .map(|s| format!(": {s}"))
                    .unwrap_or_default();
                log.warn(format!("{e}{detail}"));
                stats.index_failures += 1;
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}

/// Drop `removed` versions from a module's `@v/list`, keeping the remaining
/// lines in their original order.
///
/// The new list is written to a temporary file next to the old one and
/// renamed over it, so a crash leaves either the old or the new list. A module
/// without a list file is left alone.
pub fn rewrite_version_index(
    cache: &ModCache,
    module: &str,
    removed: &[&str],
) -> Result<IndexRewrite> {
    let path = cache.version_index(module);
    let fail = |source| HoldError::IndexRewrite {
        module: module.to_string(),
        source,
    };

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IndexRewrite::Missing),
        Err(e) => return Err(fail(e)),
    };

    let removed: HashSet<&str> = removed.iter().copied().collect();
    let (kept, dropped): (Vec<&str>, Vec<&str>) = contents
        .lines()
        .partition(|version| !removed.contains(version.trim_end()));

    let dir = path.parent().unwrap_or(Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(fail)?;
    for version in &kept {
        writeln!(temp, "{version}").map_err(fail)?;
    }
    temp.flush().map_err(fail)?;

    let permissions = fs::metadata(&path).map_err(fail)?.permissions();
    fs::set_permissions(temp.path(), permissions).map_err(fail)?;
    temp.persist(&path).map_err(|e| fail(e.error))?;

    Ok(IndexRewrite::Rewritten {
        kept: kept.len(),
        dropped: dropped.len(),
    })
}

/// Remove an extracted module directory. Returns `false` if it was already
/// gone.
fn remove_extracted(dir: &Path) -> Result<bool> {
    match fs::symlink_metadata(dir) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(HoldError::Remove {
                path: dir.to_path_buf(),
                source,
            });
        }
    }

    make_writable(dir)?;

    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(HoldError::Remove {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Extracted modules are unpacked with read-only directories; give the owner
/// write permission back so their contents can be unlinked.
fn make_writable(dir: &Path) -> Result<()> {
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(HoldError::traversal)?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let metadata = entry.metadata().map_err(HoldError::traversal)?;
        let mut permissions = metadata.permissions();
        if !permissions.readonly() {
            continue;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            permissions.set_mode(permissions.mode() | 0o700);
        }

        #[cfg(not(unix))]
        {
            permissions.set_readonly(false);
        }

        fs::set_permissions(entry.path(), permissions).map_err(|source| HoldError::Remove {
            path: entry.path().to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

/// Remove directories left empty between `dir` and the cache root.
fn prune_empty_parents(dir: &Path, root: &Path) {
    let mut current = dir.parent();
    while let Some(parent) = current {
        if parent == root || !parent.starts_with(root) {
            break;
        }
        // Fails (and stops) at the first directory that still has entries.
        if fs::remove_dir(parent).is_err() {
            break;
        }
        current = parent.parent();
    }
}
