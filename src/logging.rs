use std::fmt::Display;

/// Verbosity-aware progress output on stderr.
///
/// stdout is reserved for data (listings and the sweep prompt), so every
/// diagnostic line goes through this type instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger {
    verbose: u8,
    quiet: bool,
}

impl Logger {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    pub fn verbose(&self, level: u8, message: impl Display) {
        if self.enabled(level) {
            eprintln!("{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("warning: {message}");
        }
    }

    /// Whether a message at `level` would be printed.
    pub fn enabled(&self, level: u8) -> bool {
        !self.quiet && self.verbose >= level
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }
}
