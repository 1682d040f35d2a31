//! Per-file reports and the run summary they fold into.

use crate::engine::ParseWarning;
use crate::walk::WalkWarning;
use crate::writer::{WriteMode, WriteStatus};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// An I/O failure on one file. Recorded, never fatal.
#[derive(Error, Debug)]
#[error("{}: {source}", .path.display())]
pub struct FileError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug)]
pub enum FileOutcome {
    /// A document the engine ran on; `pages` is 0 when it had nothing to paginate.
    Processed { pages: usize },
    /// An asset, or a document passed through because of `warning`.
    Skipped(Option<ParseWarning>),
    Failed(FileError),
}

/// Files written on behalf of one source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub written: usize,
    pub unchanged: usize,
}

impl WriteCounts {
    pub fn record(&mut self, status: WriteStatus) {
        match status {
            WriteStatus::Written => self.written += 1,
            WriteStatus::Unchanged => self.unchanged += 1,
        }
    }
}

/// What happened to one source file.
#[derive(Debug)]
pub struct FileReport {
    pub relative: PathBuf,
    pub outcome: FileOutcome,
    pub writes: WriteCounts,
}

/// Totals for one invocation.
#[derive(Debug)]
pub struct RunSummary {
    pub mode: WriteMode,
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Documents split into more than one page.
    pub paginated: usize,
    /// Pages rendered across all documents, including each first page.
    pub pages: usize,
    pub files_written: usize,
    pub files_unchanged: usize,
    pub warnings: Vec<(PathBuf, ParseWarning)>,
    pub failures: Vec<FileError>,
    pub walk_warnings: Vec<WalkWarning>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            total: 0,
            processed: 0,
            skipped: 0,
            failed: 0,
            paginated: 0,
            pages: 0,
            files_written: 0,
            files_unchanged: 0,
            warnings: Vec::new(),
            failures: Vec::new(),
            walk_warnings: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn record(&mut self, report: FileReport) {
        self.total += 1;
        self.files_written += report.writes.written;
        self.files_unchanged += report.writes.unchanged;
        match report.outcome {
            FileOutcome::Processed { pages } => {
                self.processed += 1;
                self.pages += pages;
                if pages > 1 {
                    self.paginated += 1;
                }
            }
            FileOutcome::Skipped(warning) => {
                self.skipped += 1;
                if let Some(warning) = warning {
                    self.warnings.push((report.relative, warning));
                }
            }
            FileOutcome::Failed(error) => {
                self.failed += 1;
                self.failures.push(error);
            }
        }
    }

    /// Every walked file has exactly one outcome.
    pub fn is_complete(&self) -> bool {
        self.processed + self.skipped + self.failed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} processed, {} skipped, {} failed",
            self.total, self.processed, self.skipped, self.failed
        )
    }
}
