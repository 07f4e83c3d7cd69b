use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::coordinate::{Coordinate, escape};
use crate::error::{HoldError, Result};
use crate::modfile::MODFILE_NAME;

/// Top-level directory holding the toolchain's own bookkeeping.
pub(crate) const RESERVED_DIR: &str = "cache";
/// Checksum database subtree inside the download directory.
pub(crate) const SUMDB_DIR: &str = "sumdb";
/// Directory holding a module's downloaded artifacts.
pub(crate) const VERSION_DIR: &str = "@v";
/// Per-module list of known versions inside [`VERSION_DIR`].
pub(crate) const VERSION_INDEX: &str = "list";

/// Paths inside a Go module cache.
///
/// ```text
/// <root>/
///   github.com/!burnt!sushi/toml@v1.3.2/      extracted entry
///   cache/download/github.com/!burnt!sushi/toml/@v/
///     v1.3.2.info  v1.3.2.mod  v1.3.2.zip  v1.3.2.ziphash  list
///   cache/download/sumdb/                     skipped
/// ```
#[derive(Debug, Clone)]
pub struct ModCache {
    root: PathBuf,
    download: PathBuf,
}

impl ModCache {
    /// Wrap an existing cache root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(HoldError::CacheNotFound(root));
        }
        Ok(Self::new(root))
    }

    pub(crate) fn new(root: PathBuf) -> Self {
        let download = root.join(RESERVED_DIR).join("download");
        Self { root, download }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn download_dir(&self) -> &Path {
        &self.download
    }

    /// Directory of an extracted entry.
    pub fn extracted_dir(&self, coordinate: &Coordinate) -> PathBuf {
        join_slashed(&self.root, &coordinate.escaped())
    }

    /// Where an extracted entry's own `go.mod` lives.
    pub fn extracted_modfile(&self, coordinate: &Coordinate) -> PathBuf {
        self.extracted_dir(coordinate).join(MODFILE_NAME)
    }

    /// `@v` directory for a (decoded) module path.
    pub fn version_dir(&self, module: &str) -> PathBuf {
        join_slashed(&self.download, &escape(module)).join(VERSION_DIR)
    }

    /// Version index file for a (decoded) module path.
    pub fn version_index(&self, module: &str) -> PathBuf {
        self.version_dir(module).join(VERSION_INDEX)
    }
}

/// Pick the cache root the way the go command does when `--modcache` is not
/// given: `GOMODCACHE`, then the first `GOPATH` entry, then `~/go`.
pub fn default_cache_dir(
    gomodcache: Option<OsString>,
    gopath: Option<OsString>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = gomodcache.filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }

    let gopath = gopath
        .filter(|p| !p.is_empty())
        .and_then(|p| std::env::split_paths(&p).next())
        .or_else(|| home.map(|h| h.join("go")))?;

    Some(gopath.join("pkg").join("mod"))
}

/// Join a `/`-separated relative path onto `base` one segment at a time so
/// the result uses native separators.
fn join_slashed(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

/// Render `path` relative to `base` with `/` separators.
pub(crate) fn slashed_relative(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        HoldError::io(
            path,
            std::io::Error::other(format!("not inside '{}'", base.display())),
        )
    })?;

    let mut out = String::new();
    for component in relative.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| HoldError::InvalidUtf8Path(path.to_path_buf()))?;
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(segment);
    }
    Ok(out)
}
