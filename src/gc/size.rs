use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::layout::ModCache;
use super::scan::{directory_size, downloaded_files};
use crate::coordinate::Coordinate;
use crate::error::{HoldError, Result};

/// A bounded group of independent byte-counting tasks.
///
/// Every submitted task runs to completion on a dedicated rayon pool; results
/// are added to one atomic total and failures go down a channel that is
/// drained once all tasks are done. If any task failed the total is thrown
/// away and all failures are returned together.
pub(crate) struct TaskGroup {
    pool: ThreadPool,
}

impl TaskGroup {
    /// Create a group running at most `jobs` tasks at once (0 = one per CPU).
    pub(crate) fn new(jobs: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("gomod-hold-size-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub(crate) fn sum<T, F>(&self, items: &[T], task: F) -> Result<u64>
    where
        T: Sync,
        F: Fn(&T) -> Result<u64> + Sync,
    {
        let total = AtomicU64::new(0);
        let (errors_tx, errors_rx) = mpsc::channel();

        self.pool.install(|| {
            items
                .par_iter()
                .for_each_with(errors_tx, |errors, item| match task(item) {
                    Ok(bytes) => {
                        total.fetch_add(bytes, Ordering::Relaxed);
                    }
                    Err(e) => {
                        let _ = errors.send(e);
                    }
                });
        });

        let errors: Vec<HoldError> = errors_rx.into_iter().collect();
        if !errors.is_empty() {
            return Err(HoldError::SizeAggregation {
                failed: errors.len(),
                errors,
            });
        }

        Ok(total.into_inner())
    }
}

enum Entry<'a> {
    Extracted(&'a Coordinate),
    Downloaded(&'a Coordinate),
}

/// Total bytes held by the given extracted and downloaded entries.
///
/// One task per entry; an extracted entry is the sum of the files below its
/// directory, a downloaded entry the sum of its artifact files.
pub fn reclaimable_size(
    cache: &ModCache,
    extracted: &[Coordinate],
    downloaded: &[Coordinate],
    jobs: usize,
) -> Result<u64> {
    let entries: Vec<Entry<'_>> = extracted
        .iter()
        .map(Entry::Extracted)
        .chain(downloaded.iter().map(Entry::Downloaded))
        .collect();

    if entries.is_empty() {
        return Ok(0);
    }

    TaskGroup::new(jobs)?.sum(&entries, |entry| match entry {
        Entry::Extracted(coordinate) => directory_size(&cache.extracted_dir(coordinate)),
        Entry::Downloaded(coordinate) => downloaded_size(cache, coordinate),
    })
}

fn downloaded_size(cache: &ModCache, coordinate: &Coordinate) -> Result<u64> {
    let mut total = 0;
    for file in downloaded_files(cache, coordinate)? {
        let metadata =
            std::fs::metadata(&file).map_err(|source| HoldError::io(&file, source))?;
        total += metadata.len();
    }
    Ok(total)
}

/// Format size in human-readable binary units
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{bytes} B"),
        _ => format!("{size:.1} {}", UNITS[unit]),
    }
}
