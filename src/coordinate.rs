//! Module coordinates and the case-escaping used for cache paths.
//!
//! The module cache has to live on case-insensitive filesystems, so every
//! uppercase ASCII letter in a module path or version is written as `!`
//! followed by its lowercase form: `github.com/BurntSushi/toml` is stored
//! under `github.com/!burnt!sushi/toml`. [`escape`] and [`unescape`] convert
//! between the two forms and are inverses for any input that does not itself
//! contain `!`.
//!
//! A [`Coordinate`] always holds the decoded form. Everything that compares
//! coordinates (the in-use set, the unused diff, index rewrites) therefore
//! works on decoded strings, and paths are re-escaped only when touching the
//! filesystem.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{HoldError, Result};

/// Separator between module path and version, both in `path@version` strings
/// and in extracted directory names.
pub const SEPARATOR: char = '@';

/// Marker introducing an escaped uppercase letter.
pub const ESCAPE: char = '!';

/// A module path paired with a version, e.g. `golang.org/x/mod@v0.14.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    module: String,
    version: String,
}

impl Coordinate {
    /// Build a coordinate from its decoded parts.
    ///
    /// The module path must be non-empty and free of `@`; the version must be
    /// a non-empty token free of `@` and whitespace.
    pub fn new(module: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let module = module.into();
        let version = version.into();

        let invalid = |reason: &str| HoldError::InvalidCoordinate {
            input: format!("{module}{SEPARATOR}{version}"),
            reason: reason.to_string(),
        };

        if module.is_empty() {
            return Err(invalid("module path is empty"));
        }
        if module.contains(SEPARATOR) {
            return Err(invalid("module path contains '@'"));
        }
        if version.is_empty() {
            return Err(invalid("version is empty"));
        }
        if version.contains(SEPARATOR) || version.contains(char::is_whitespace) {
            return Err(invalid("version is not a single token"));
        }

        Ok(Self { module, version })
    }

    /// Build a coordinate from the escaped parts found on disk.
    pub fn from_escaped(module: &str, version: &str) -> Result<Self> {
        Self::new(unescape(module), unescape(version))
    }

    /// Parse an escaped `path@version` string such as an extracted directory's
    /// path relative to the cache root.
    pub fn parse_escaped(s: &str) -> Result<Self> {
        let (module, version) = split(s)?;
        Self::from_escaped(module, version)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn escaped_module(&self) -> Cow<'_, str> {
        escape(&self.module)
    }

    pub fn escaped_version(&self) -> Cow<'_, str> {
        escape(&self.version)
    }

    /// The escaped `path@version` form used as an extracted directory path.
    pub fn escaped(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            self.escaped_module(),
            self.escaped_version()
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.module, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = HoldError;

    /// Parse a decoded `path@version` string.
    fn from_str(s: &str) -> Result<Self> {
        let (module, version) = split(s)?;
        Self::new(module, version)
    }
}

fn split(s: &str) -> Result<(&str, &str)> {
    let mut parts = s.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(module), Some(version), None) => Ok((module, version)),
        _ => Err(HoldError::InvalidCoordinate {
            input: s.to_string(),
            reason: "expected exactly one '@' between module path and version".to_string(),
        }),
    }
}

/// Escape uppercase ASCII letters as `!` + lowercase.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 4);
    for ch in s.chars() {
        if ch.is_ascii_uppercase() {
            out.push(ESCAPE);
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

/// Undo [`escape`].
///
/// A `!` that is not followed by a lowercase ASCII letter never appears in a
/// well-formed cache; it is passed through unchanged rather than rejected.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE
            && let Some(&next) = chars.peek()
            && next.is_ascii_lowercase()
        {
            out.push(next.to_ascii_uppercase());
            chars.next();
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
