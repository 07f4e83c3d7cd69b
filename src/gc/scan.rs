use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::layout::{
    ModCache, RESERVED_DIR, SUMDB_DIR, VERSION_DIR, VERSION_INDEX, slashed_relative,
};
use crate::coordinate::{Coordinate, SEPARATOR};
use crate::error::{HoldError, Result};

/// Find every extracted entry under the cache root.
///
/// A directory whose name contains `@` is one entry; its subtree is not
/// descended into. The top-level `cache` directory is skipped entirely.
/// Entries are returned in path order.
pub fn scan_extracted(cache: &ModCache) -> Result<Vec<Coordinate>> {
    let root = cache.root();
    let mut entries = Vec::with_capacity(128);
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(HoldError::traversal)?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name();
        if entry.depth() == 1 && name == RESERVED_DIR {
            walker.skip_current_dir();
            continue;
        }

        let Some(name) = name.to_str() else {
            return Err(HoldError::InvalidUtf8Path(entry.path().to_path_buf()));
        };
        if name.contains(SEPARATOR) {
            let relative = slashed_relative(root, entry.path())?;
            entries.push(Coordinate::parse_escaped(&relative)?);
            walker.skip_current_dir();
        }
    }

    Ok(entries)
}

/// Find every downloaded entry under `cache/download`.
///
/// Each file directly inside an `@v` directory belongs to the coordinate made
/// of the module path (the `@v` directory's parent, relative to the download
/// root) and the file's stem. The several files of one version collapse into
/// a single entry, reported in first-seen path order. The `sumdb` subtree is
/// skipped. A cache without a download directory has no downloaded entries.
pub fn scan_downloaded(cache: &ModCache) -> Result<Vec<Coordinate>> {
    let download = cache.download_dir();
    if !download.is_dir() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::with_capacity(256);
    let mut entries = Vec::with_capacity(256);
    let mut walker = WalkDir::new(download)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(HoldError::traversal)?;

        if entry.file_type().is_dir() {
            if entry.depth() == 1 && entry.file_name() == SUMDB_DIR {
                walker.skip_current_dir();
            }
            continue;
        }

        let path = entry.path();
        let Some(version_dir) = path.parent().filter(|p| p.ends_with(VERSION_DIR)) else {
            continue;
        };
        let Some(module_dir) = version_dir.parent() else {
            continue;
        };
        let name = entry
            .file_name()
            .to_str()
            .ok_or_else(|| HoldError::InvalidUtf8Path(path.to_path_buf()))?;
        let Some(stem) = version_stem(name) else {
            continue;
        };

        let module = slashed_relative(download, module_dir)?;
        let coordinate = Coordinate::from_escaped(&module, stem)?;
        if seen.insert(coordinate.clone()) {
            entries.push(coordinate);
        }
    }

    Ok(entries)
}

/// All files making up one downloaded entry, sorted by name.
///
/// Fails if the module's `@v` directory cannot be read.
pub fn downloaded_files(cache: &ModCache, coordinate: &Coordinate) -> Result<Vec<PathBuf>> {
    let version_dir = cache.version_dir(coordinate.module());
    let stem = coordinate.escaped_version();

    let entries =
        fs::read_dir(&version_dir).map_err(|source| HoldError::io(&version_dir, source))?;

    let mut files = Vec::with_capacity(6);
    for entry in entries {
        let entry = entry.map_err(|source| HoldError::io(&version_dir, source))?;
        let file_type = entry
            .file_type()
            .map_err(|source| HoldError::io(entry.path(), source))?;
        if file_type.is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .and_then(version_stem)
            .is_some_and(|s| s == stem)
        {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Version part of an artifact file name: everything before the last `.`.
///
/// Returns `None` for names without an extension and for the version index
/// (`list`) and its lock file.
pub(crate) fn version_stem(file_name: &str) -> Option<&str> {
    let (stem, _extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || stem == VERSION_INDEX {
        return None;
    }
    Some(stem)
}

/// Total size of the regular files below `dir`.
pub(crate) fn directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(HoldError::traversal)?;
        if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(HoldError::traversal)?;
            total += metadata.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_stem() {
        assert_eq!(version_stem("v1.2.3.info"), Some("v1.2.3"));
        assert_eq!(version_stem("v1.2.3.ziphash"), Some("v1.2.3"));
        assert_eq!(version_stem("v1.0.0-rc.1.zip"), Some("v1.0.0-rc.1"));
        assert_eq!(version_stem("v1.2.3.lock"), Some("v1.2.3"));
        assert_eq!(version_stem("list"), None);
        assert_eq!(version_stem("list.lock"), None);
        assert_eq!(version_stem(".hidden"), None);
    }
}
