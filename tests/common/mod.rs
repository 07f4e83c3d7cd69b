#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;

/// Every artifact the go command downloads for one version.
pub const ARTIFACTS: [&str; 4] = ["info", "mod", "zip", "ziphash"];

/// A synthetic Go module cache next to a project directory.
///
/// Module paths are given in their on-disk (escaped) form so tests control
/// exactly what the scanner sees.
pub struct FakeModCache {
    dir: TempDir,
}

impl FakeModCache {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("mod")).unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        Self { dir }
    }

    /// Module cache root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("mod")
    }

    /// Project directory holding root manifests.
    pub fn project(&self) -> PathBuf {
        self.dir.path().join("app")
    }

    /// Directory of an extracted entry.
    pub fn extracted_dir(&self, module: &str, version: &str) -> PathBuf {
        join_slashed(&self.root(), &format!("{module}@{version}"))
    }

    /// `@v` directory of a module.
    pub fn version_dir(&self, module: &str) -> PathBuf {
        join_slashed(&self.root().join("cache").join("download"), module).join("@v")
    }

    /// Create an extracted entry with a `bytes`-sized source file and,
    /// optionally, its own go.mod.
    pub fn extracted(&self, module: &str, version: &str, bytes: usize, modfile: Option<&str>) {
        let dir = self.extracted_dir(module, version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("source.go"), vec![b'x'; bytes]).unwrap();
        if let Some(contents) = modfile {
            fs::write(dir.join("go.mod"), contents).unwrap();
        }
    }

    /// Create all four artifacts of a downloaded entry, `bytes` each.
    pub fn downloaded(&self, module: &str, version: &str, bytes: usize) {
        let dir = self.version_dir(module);
        fs::create_dir_all(&dir).unwrap();
        for ext in ARTIFACTS {
            fs::write(dir.join(format!("{version}.{ext}")), vec![b'z'; bytes]).unwrap();
        }
    }

    /// Extracted plus downloaded, the usual state after `go mod download`.
    pub fn module(&self, module: &str, version: &str, modfile: Option<&str>) {
        self.extracted(module, version, 16, modfile);
        self.downloaded(module, version, 8);
    }

    pub fn version_list(&self, module: &str, versions: &[&str]) {
        let dir = self.version_dir(module);
        fs::create_dir_all(&dir).unwrap();
        let contents: String = versions.iter().map(|v| format!("{v}\n")).collect();
        fs::write(dir.join("list"), contents).unwrap();
    }

    pub fn read_version_list(&self, module: &str) -> String {
        fs::read_to_string(self.version_dir(module).join("list")).unwrap()
    }

    pub fn artifact(&self, module: &str, version: &str, ext: &str) -> PathBuf {
        self.version_dir(module).join(format!("{version}.{ext}"))
    }

    /// Write a root manifest inside the project directory.
    pub fn root_modfile(&self, relative: &str, contents: &str) -> PathBuf {
        let path = join_slashed(&self.project(), relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }
}

/// A go.mod declaring `module` and requiring each `module version` pair.
pub fn modfile(module: &str, requires: &[(&str, &str)]) -> String {
    let mut out = format!("module {module}\n\ngo 1.22\n");
    if !requires.is_empty() {
        out.push_str("\nrequire (\n");
        for (path, version) in requires {
            out.push_str(&format!("\t{path} {version}\n"));
        }
        out.push_str(")\n");
    }
    out
}

fn join_slashed(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}
