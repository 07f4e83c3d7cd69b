use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use tempfile::TempDir;

use super::*;
use crate::cli::Commands;
use crate::error::HoldError;

/// Cache with `example.com/pkg` at v1.0.0 (unused) and v2.0.0 (required),
/// both extracted and downloaded, plus a project requiring v2.0.0.
struct Setup {
    _dir: TempDir,
    cache: PathBuf,
    project: PathBuf,
}

impl Setup {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("mod");
        let project = dir.path().join("app");

        for version in ["v1.0.0", "v2.0.0"] {
            let extracted = cache.join("example.com").join(format!("pkg@{version}"));
            fs::create_dir_all(&extracted).unwrap();
            fs::write(extracted.join("pkg.go"), "package pkg\n").unwrap();

            let version_dir = cache.join("cache/download/example.com/pkg/@v");
            fs::create_dir_all(&version_dir).unwrap();
            for ext in ["info", "mod", "zip", "ziphash"] {
                fs::write(version_dir.join(format!("{version}.{ext}")), "data").unwrap();
            }
        }
        fs::write(
            cache.join("cache/download/example.com/pkg/@v/list"),
            "v1.0.0\nv2.0.0\n",
        )
        .unwrap();

        fs::create_dir_all(&project).unwrap();
        fs::write(
            project.join("go.mod"),
            "module example.com/app\n\nrequire example.com/pkg v2.0.0\n",
        )
        .unwrap();

        Self {
            _dir: dir,
            cache,
            project,
        }
    }

    fn cli(&self, command: Commands) -> Cli {
        Cli::builder()
            .modcache(&self.cache)
            .modfile(&self.project)
            .quiet(true)
            .command(command)
            .build()
            .unwrap()
    }

    fn run(&self, command: Commands, input: &str) -> Result<String> {
        let mut output = Vec::new();
        execute_with_io(&self.cli(command), Cursor::new(input), &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    fn extracted(&self, version: &str) -> PathBuf {
        self.cache.join("example.com").join(format!("pkg@{version}"))
    }

    fn artifact(&self, name: &str) -> PathBuf {
        self.cache.join("cache/download/example.com/pkg/@v").join(name)
    }
}

#[test]
fn test_choice_parse() {
    assert_eq!(Choice::parse("1\n"), Choice::Remove);
    assert_eq!(Choice::parse(" r "), Choice::Remove);
    assert_eq!(Choice::parse("2"), Choice::List);
    assert_eq!(Choice::parse("l\r\n"), Choice::List);
    assert_eq!(Choice::parse(""), Choice::Quit);
    assert_eq!(Choice::parse("yes"), Choice::Quit);
}

#[test]
fn test_sweep_quit_leaves_cache_alone() {
    let setup = Setup::new();
    let output = setup.run(Commands::Sweep, "q\n").unwrap();

    assert!(output.starts_with("Found 2 unused modules, occupying"));
    assert!(setup.extracted("v1.0.0").is_dir());
    assert!(setup.artifact("v1.0.0.zip").is_file());
}

#[test]
fn test_sweep_eof_quits() {
    let setup = Setup::new();
    setup.run(Commands::Sweep, "").unwrap();
    assert!(setup.extracted("v1.0.0").is_dir());
}

#[test]
fn test_sweep_list() {
    let setup = Setup::new();
    let output = setup.run(Commands::Sweep, "2\n").unwrap();

    let listed: Vec<&str> = output.lines().skip(1).collect();
    assert_eq!(listed.len(), 5);
    assert!(listed[0].ends_with("pkg@v1.0.0"));
    assert!(listed[1..].iter().all(|l| l.contains("v1.0.0.")));
    assert!(setup.extracted("v1.0.0").is_dir());
}

#[test]
fn test_sweep_remove() {
    let setup = Setup::new();
    let output = setup.run(Commands::Sweep, "r\n").unwrap();

    assert!(output.contains("Removed 1 extracted and 1 downloaded entries (4 files)"));
    assert!(!setup.extracted("v1.0.0").exists());
    assert!(setup.extracted("v2.0.0").is_dir());
    assert!(!setup.artifact("v1.0.0.info").exists());
    assert!(setup.artifact("v2.0.0.info").is_file());
    assert_eq!(fs::read_to_string(setup.artifact("list")).unwrap(), "v2.0.0\n");
}

#[test]
fn test_survey_only_lists() {
    let setup = Setup::new();
    let output = setup.run(Commands::Survey, "").unwrap();

    assert_eq!(output.lines().count(), 5);
    assert!(!output.contains("Found"));
    assert!(setup.artifact("v1.0.0.zip").is_file());
}

#[test]
fn test_jettison_then_nothing_left() {
    let setup = Setup::new();
    setup.run(Commands::Jettison, "").unwrap();

    // Second pass finds nothing and prints nothing.
    let output = setup.run(Commands::Sweep, "1\n").unwrap();
    assert!(output.is_empty());
    assert!(setup.extracted("v2.0.0").is_dir());
}

#[test]
fn test_missing_modfile_is_config_error() {
    let setup = Setup::new();
    let cli = Cli::builder()
        .modcache(&setup.cache)
        .command(Commands::Survey)
        .build()
        .unwrap();

    let result = execute_with_io(&cli, Cursor::new(""), Vec::new());
    assert!(matches!(result, Err(HoldError::Config(_))));
}

#[test]
fn test_missing_cache_dir() {
    let setup = Setup::new();
    let cli = Cli::builder()
        .modcache(setup.cache.join("nope"))
        .modfile(&setup.project)
        .build()
        .unwrap();

    let result = execute_with_io(&cli, Cursor::new(""), Vec::new());
    assert!(matches!(result, Err(HoldError::CacheNotFound(p)) if p.ends_with("nope")));
}

#[test]
fn test_directory_without_modfiles_is_rejected() {
    let setup = Setup::new();
    let empty = setup.project.join("empty");
    fs::create_dir_all(&empty).unwrap();

    let cli = Cli::builder()
        .modcache(&setup.cache)
        .modfile(&empty)
        .build()
        .unwrap();

    let result = execute_with_io(&cli, Cursor::new("r\n"), Vec::new());
    assert!(matches!(result, Err(HoldError::Config(_))));
    assert!(setup.extracted("v1.0.0").is_dir());
}
