//! Lax `go.mod` parsing.
//!
//! Only the directives that name other modules matter here: `require` and
//! `replace`, in both their single-line and parenthesized block forms. The
//! `module` line is kept for logging. Every other directive (`go`,
//! `toolchain`, `exclude`, `retract`, `tool`, ...) is skipped without being
//! validated, the same way the Go toolchain reads the `go.mod` files of
//! dependencies.
//!
//! ```
//! use gomod_hold::modfile::Modfile;
//!
//! let modfile = Modfile::parse(
//!     "go.mod",
//!     b"module example.com/app\n\nrequire golang.org/x/mod v0.14.0\n",
//! )?;
//! assert_eq!(modfile.require[0].to_string(), "golang.org/x/mod@v0.14.0");
//! # Ok::<(), gomod_hold::modfile::ModfileError>(())
//! ```

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::coordinate::{Coordinate, SEPARATOR};

/// File name searched for when a directory is given as a root.
pub const MODFILE_NAME: &str = "go.mod";

/// A parsed `go.mod` file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Modfile {
    /// Path declared by the `module` directive, if any
    pub module: Option<String>,
    /// `require` directives, in file order
    pub require: Vec<Coordinate>,
    /// `replace` directives, in file order
    pub replace: Vec<Replace>,
}

/// A `replace old [v] => new [v]` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: ReplaceSide,
    pub new: ReplaceSide,
}

/// One side of a `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceSide {
    /// A module path with an explicit version
    Versioned(Coordinate),
    /// A module path without a version, or a local directory
    Unversioned(String),
}

impl ReplaceSide {
    /// The coordinate named by this side, when it has a version.
    pub fn coordinate(&self) -> Option<&Coordinate> {
        match self {
            ReplaceSide::Versioned(coordinate) => Some(coordinate),
            ReplaceSide::Unversioned(_) => None,
        }
    }
}

/// A `go.mod` syntax error with its location.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{filename}:{line}: {message}")]
pub struct ModfileError {
    pub filename: String,
    /// 1-based line number
    pub line: usize,
    /// Byte offset of the offending token within the file
    pub offset: usize,
    /// Length in bytes of the offending token
    pub len: usize,
    pub message: String,
}

impl Modfile {
    /// Parse `data`, using `filename` in error messages.
    pub fn parse(filename: &str, data: &[u8]) -> Result<Self, ModfileError> {
        let text = std::str::from_utf8(data).map_err(|e| {
            let offset = e.valid_up_to();
            ModfileError {
                filename: filename.to_string(),
                line: data[..offset].iter().filter(|&&b| b == b'\n').count() + 1,
                offset,
                len: 1,
                message: "file is not valid UTF-8".to_string(),
            }
        })?;

        let mut parser = Parser {
            filename,
            modfile: Modfile::default(),
        };
        let mut block: Option<(usize, Token<'_>)> = None;
        let mut offset = 0;

        for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
            let line = idx + 1;
            let tokens = tokenize(raw_line, offset).map_err(|(start, len, message)| {
                parser.error(line, start, len, message)
            })?;
            offset += raw_line.len();

            if tokens.is_empty() {
                continue;
            }

            if let Some((_, verb)) = block {
                if tokens.len() == 1 && tokens[0].text == ")" {
                    block = None;
                    continue;
                }
                parser.directive(line, verb, &tokens)?;
                continue;
            }

            let verb = tokens[0];
            let args = &tokens[1..];
            match args {
                [open] if open.text == "(" => block = Some((line, verb)),
                [open, close] if open.text == "(" && close.text == ")" => {}
                _ => parser.directive(line, verb, args)?,
            }
        }

        if let Some((line, verb)) = block {
            return Err(parser.error(
                line,
                verb.start,
                verb.text.len(),
                format!("unterminated {} block", verb.text),
            ));
        }

        Ok(parser.modfile)
    }

    /// Every coordinate this file refers to: requirements first, then both
    /// sides of each versioned replacement.
    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.require.iter().chain(
            self.replace
                .iter()
                .flat_map(|r| [r.old.coordinate(), r.new.coordinate()])
                .flatten(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    /// Byte offset within the whole file
    start: usize,
}

struct Parser<'f> {
    filename: &'f str,
    modfile: Modfile,
}

impl Parser<'_> {
    fn error(
        &self,
        line: usize,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> ModfileError {
        ModfileError {
            filename: self.filename.to_string(),
            line,
            offset,
            len: len.max(1),
            message: message.into(),
        }
    }

    fn directive(
        &mut self,
        line: usize,
        verb: Token<'_>,
        args: &[Token<'_>],
    ) -> Result<(), ModfileError> {
        match verb.text {
            "module" => match args {
                [path] => {
                    self.modfile.module = Some(unquote(path.text).to_string());
                    Ok(())
                }
                _ => Err(self.usage(line, verb, "module module/path")),
            },
            "require" => match args {
                [path, version] => {
                    let coordinate = self.coordinate(line, *path, *version)?;
                    self.modfile.require.push(coordinate);
                    Ok(())
                }
                _ => Err(self.usage(line, verb, "require module/path v1.2.3")),
            },
            "replace" => {
                let usage =
                    "replace module/path [v1.2.3] => other/module v1.4.5 or local/directory";
                let Some(arrow) = args.iter().position(|t| t.text == "=>") else {
                    return Err(self.usage(line, verb, usage));
                };
                let old = match &args[..arrow] {
                    [path] => self.unversioned(line, *path)?,
                    [path, version] => {
                        ReplaceSide::Versioned(self.coordinate(line, *path, *version)?)
                    }
                    _ => return Err(self.usage(line, verb, usage)),
                };
                let new = match &args[arrow + 1..] {
                    [path] => ReplaceSide::Unversioned(unquote(path.text).to_string()),
                    [path, version] => {
                        ReplaceSide::Versioned(self.coordinate(line, *path, *version)?)
                    }
                    _ => return Err(self.usage(line, verb, usage)),
                };
                self.modfile.replace.push(Replace { old, new });
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn usage(&self, line: usize, verb: Token<'_>, usage: &str) -> ModfileError {
        self.error(line, verb.start, verb.text.len(), format!("usage: {usage}"))
    }

    fn unversioned(&self, line: usize, path: Token<'_>) -> Result<ReplaceSide, ModfileError> {
        let module = self.module_path(line, path)?;
        Ok(ReplaceSide::Unversioned(module.to_string()))
    }

    fn module_path<'t>(&self, line: usize, path: Token<'t>) -> Result<&'t str, ModfileError> {
        let module = unquote(path.text);
        if module.is_empty() || module.contains(SEPARATOR) {
            return Err(self.error(
                line,
                path.start,
                path.text.len(),
                format!("malformed module path {module:?}"),
            ));
        }
        Ok(module)
    }

    fn coordinate(
        &self,
        line: usize,
        path: Token<'_>,
        version: Token<'_>,
    ) -> Result<Coordinate, ModfileError> {
        let module = self.module_path(line, path)?;
        let raw = unquote(version.text);
        let Some(canonical) = canonical_version(raw) else {
            return Err(self.error(
                line,
                version.start,
                version.text.len(),
                format!("invalid module version {raw:?}"),
            ));
        };
        Coordinate::new(module, canonical)
            .map_err(|e| self.error(line, path.start, path.text.len(), e.to_string()))
    }
}

/// Canonical `vMAJOR.MINOR.PATCH[-pre]` form of a version.
///
/// `v1` and `v1.2` are padded with zeros. Build metadata is dropped except
/// for `+incompatible`, which names a distinct cache entry. Short forms may
/// not carry a prerelease.
fn canonical_version(version: &str) -> Option<String> {
    static SEMVER_RE: OnceLock<Regex> = OnceLock::new();

    let re = SEMVER_RE.get_or_init(|| {
        Regex::new(
            r"^v(0|[1-9][0-9]*)(?:\.(0|[1-9][0-9]*)(?:\.(0|[1-9][0-9]*))?)?(-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
        )
        .expect("semver regex should compile")
    });

    let caps = re.captures(version)?;
    let major = &caps[1];
    let minor = caps.get(2).map_or("0", |m| m.as_str());
    let patch = caps.get(3).map_or("0", |m| m.as_str());
    let prerelease = caps.get(4).map_or("", |m| m.as_str());
    let build = caps.get(5).map_or("", |m| m.as_str());

    if caps.get(3).is_none() && !prerelease.is_empty() {
        return None;
    }

    let mut canonical = format!("v{major}.{minor}.{patch}{prerelease}");
    if build == "+incompatible" {
        canonical.push_str(build);
    }
    Some(canonical)
}

fn unquote(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2
        && matches!(bytes[0], b'"' | b'`')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

/// Split one line into tokens, dropping `//` comments.
///
/// `(`, `)` and `=>` are always tokens of their own. Errors are reported as
/// `(offset, len, message)` relative to the file.
fn tokenize(line: &str, base: usize) -> Result<Vec<Token<'_>>, (usize, usize, &'static str)> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        let b = bytes[i];

        if b.is_ascii_whitespace() {
            i += 1;
        } else if rest.starts_with(b"//") {
            break;
        } else if rest.starts_with(b"=>") {
            tokens.push(Token {
                text: &line[i..i + 2],
                start: base + i,
            });
            i += 2;
        } else if b == b'(' || b == b')' {
            tokens.push(Token {
                text: &line[i..i + 1],
                start: base + i,
            });
            i += 1;
        } else if b == b'"' || b == b'`' {
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] != b {
                if b == b'"' && bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= bytes.len() {
                return Err((
                    base + start,
                    line.trim_end().len() - start,
                    "unterminated quoted string",
                ));
            }
            i += 1;
            tokens.push(Token {
                text: &line[start..i],
                start: base + start,
            });
        } else {
            let start = i;
            while i < bytes.len() {
                let rest = &bytes[i..];
                if bytes[i].is_ascii_whitespace()
                    || matches!(bytes[i], b'(' | b')' | b'"' | b'`')
                    || rest.starts_with(b"//")
                    || rest.starts_with(b"=>")
                {
                    break;
                }
                i += 1;
            }
            tokens.push(Token {
                text: &line[start..i],
                start: base + start,
            });
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn parse(text: &str) -> Result<Modfile, ModfileError> {
        Modfile::parse("go.mod", text.as_bytes())
    }

    #[test]
    fn test_require_block_and_single_line() {
        let modfile = parse(
            r#"module example.com/app

go 1.22

require github.com/spf13/cobra v1.8.0

require (
	golang.org/x/mod v0.14.0 // indirect
	"github.com/BurntSushi/toml" v1.3.2
)
"#,
        )
        .unwrap();

        assert_eq!(modfile.module.as_deref(), Some("example.com/app"));
        assert_eq!(
            modfile.require,
            vec![
                coord("github.com/spf13/cobra@v1.8.0"),
                coord("golang.org/x/mod@v0.14.0"),
                coord("github.com/BurntSushi/toml@v1.3.2"),
            ]
        );
    }

    #[test]
    fn test_replace_forms() {
        let modfile = parse(
            "module m\n\
             replace example.com/a v1.0.0 => example.com/b v1.1.0\n\
             replace (\n\
             \texample.com/c => ../c\n\
             \texample.com/d=>example.com/e v0.2.0\n\
             )\n",
        )
        .unwrap();

        assert_eq!(modfile.replace.len(), 3);
        assert_eq!(
            modfile.replace[0].old,
            ReplaceSide::Versioned(coord("example.com/a@v1.0.0"))
        );
        assert_eq!(
            modfile.replace[1].new,
            ReplaceSide::Unversioned("../c".to_string())
        );
        assert_eq!(
            modfile.replace[2].old,
            ReplaceSide::Unversioned("example.com/d".to_string())
        );

        let all: Vec<String> = modfile.coordinates().map(|c| c.to_string()).collect();
        assert_eq!(
            all,
            vec![
                "example.com/a@v1.0.0",
                "example.com/b@v1.1.0",
                "example.com/e@v0.2.0",
            ]
        );
    }

    #[test]
    fn test_other_directives_are_ignored() {
        let modfile = parse(
            "module m\n\
             toolchain go1.22.1\n\
             exclude example.com/x v1.0.0\n\
             retract [v1.0.0, v1.1.0]\n\
             godebug default=go1.21\n\
             require example.com/y v0.0.0-20230101000000-abcdefabcdef\n",
        )
        .unwrap();

        assert_eq!(
            modfile.require,
            vec![coord("example.com/y@v0.0.0-20230101000000-abcdefabcdef")]
        );
    }

    #[test]
    fn test_incompatible_and_prerelease_versions() {
        let modfile = parse(
            "require (\n\
             \texample.com/old v2.0.0+incompatible\n\
             \texample.com/pre v1.0.0-rc.1\n\
             )\n",
        )
        .unwrap();
        assert_eq!(modfile.require[0].version(), "v2.0.0+incompatible");
        assert_eq!(modfile.require[1].version(), "v1.0.0-rc.1");
    }

    #[test]
    fn test_versions_are_canonicalized() {
        let modfile = parse(
            "require (\n\
             \texample.com/short v1.2\n\
             \texample.com/major v3\n\
             \texample.com/meta v1.0.0+meta\n\
             \texample.com/both v2.1.0-rc.1+build.7\n\
             )\n",
        )
        .unwrap();

        let versions: Vec<&str> = modfile.require.iter().map(|c| c.version()).collect();
        assert_eq!(versions, ["v1.2.0", "v3.0.0", "v1.0.0", "v2.1.0-rc.1"]);
    }

    #[test]
    fn test_short_version_with_prerelease_is_rejected() {
        let err = parse("require example.com/a v1.2-pre\n").unwrap_err();
        assert!(err.message.contains("invalid module version"));
    }

    #[test]
    fn test_invalid_version_reports_span() {
        let text = "module m\nrequire example.com/a latest\n";
        let err = parse(text).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(&text[err.offset..err.offset + err.len], "latest");
        assert!(err.message.contains("invalid module version"));
    }

    #[test]
    fn test_malformed_directives() {
        assert!(parse("require example.com/a\n").is_err());
        assert!(parse("replace example.com/a v1.0.0 example.com/b v1.0.0\n").is_err());
        assert!(parse("require (\n\texample.com/a v1.0.0\n").is_err());
        assert!(parse("module \"unterminated\n").is_err());
        assert!(Modfile::parse("go.mod", b"module \xff\n").is_err());
    }

    #[test]
    fn test_empty_block_and_comments() {
        let modfile = parse("// header\nrequire ()\nrequire (\n)\n").unwrap();
        assert!(modfile.require.is_empty());
        assert!(modfile.module.is_none());
    }
}
