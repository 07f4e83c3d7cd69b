//! Sweep, survey and jettison: what to do with the unused entries once they
//! are known.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::cli::Commands;
use crate::error::{HoldError, Result};
use crate::gc::config::{Plan, Sweeper};
use crate::gc::format_size;
use crate::gc::reclaim::RemovalStats;
use crate::logging::Logger;

const PROMPT: &str = "Remove them [1/r], list them [2/l], or quit [any other key]? ";

/// An answer to the sweep prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Remove,
    List,
    Quit,
}

impl Choice {
    /// Interpret one line of input. Anything unrecognised quits.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "1" | "r" | "R" => Choice::Remove,
            "2" | "l" | "L" => Choice::List,
            _ => Choice::Quit,
        }
    }
}

pub struct Sweep<'a> {
    sweeper: &'a Sweeper,
    log: Logger,
}

impl<'a> Sweep<'a> {
    pub fn new(sweeper: &'a Sweeper, log: Logger) -> Self {
        Self { sweeper, log }
    }

    /// Plan the sweep, then list, remove or prompt depending on `command`.
    pub fn run(
        &self,
        command: Commands,
        mut input: impl BufRead,
        mut output: impl Write,
    ) -> Result<()> {
        let plan = self.sweeper.plan()?;

        if plan.is_empty() {
            self.log.info(format!(
                "No unused modules found in {}",
                self.sweeper.cache_dir().display()
            ));
            return Ok(());
        }

        let summary = format!(
            "Found {} unused modules, occupying {}",
            plan.unused_count(),
            format_size(plan.reclaimable_bytes())
        );

        match command {
            Commands::Survey => {
                self.log.info(summary);
                self.list(&plan, &mut output)
            }
            Commands::Jettison => {
                writeln!(output, "{summary}").map_err(stdout_error)?;
                self.remove(&plan, &mut output)
            }
            Commands::Sweep => {
                writeln!(output, "{summary}").map_err(stdout_error)?;
                match self.prompt(&mut input, &mut output)? {
                    Choice::Remove => self.remove(&plan, &mut output),
                    Choice::List => self.list(&plan, &mut output),
                    Choice::Quit => {
                        self.log.verbose(1, "Leaving the module cache untouched");
                        Ok(())
                    }
                }
            }
        }
    }

    fn prompt(&self, input: &mut impl BufRead, output: &mut impl Write) -> Result<Choice> {
        write!(output, "{PROMPT}").map_err(stdout_error)?;
        output.flush().map_err(stdout_error)?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|source| HoldError::io(Path::new("<stdin>"), source))?;
        if read == 0 {
            // Terminate the prompt line on EOF.
            writeln!(output).map_err(stdout_error)?;
            return Ok(Choice::Quit);
        }

        Ok(Choice::parse(&line))
    }

    fn list(&self, plan: &Plan, output: &mut impl Write) -> Result<()> {
        for path in self.sweeper.list(plan)? {
            writeln!(output, "{}", path.display()).map_err(stdout_error)?;
        }
        Ok(())
    }

    fn remove(&self, plan: &Plan, output: &mut impl Write) -> Result<()> {
        let stats = self.sweeper.remove(plan)?;
        writeln!(output, "{}", removal_report(&stats)).map_err(stdout_error)?;
        if stats.index_failures > 0 {
            self.log.warn(format!(
                "{} version lists could not be rewritten",
                stats.index_failures
            ));
        }
        Ok(())
    }
}

fn removal_report(stats: &RemovalStats) -> String {
    format!(
        "Removed {} extracted and {} downloaded entries ({} files), freed {}",
        stats.extracted_removed,
        stats.downloaded_removed,
        stats.files_removed,
        format_size(stats.bytes_freed)
    )
}

fn stdout_error(source: std::io::Error) -> HoldError {
    HoldError::io(Path::new("<stdout>"), source)
}
