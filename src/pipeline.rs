//! Run driver: walk the source tree, transform every document, write results.
//!
//! ```text
//! Idle ──setup──▶ Walking ──▶ Processing ──▶ Reporting ──▶ Done
//!   └────────────── setup failure ──────────────────────────▲
//! ```
//!
//! Setup resolves both roots before anything is written. The source must
//! exist and be a readable directory; only then is the destination created.
//! A source that equals the destination (after canonicalization) puts the run
//! in place: generated pages are written next to their documents and nothing
//! else is touched. Otherwise the whole tree is mirrored.
//!
//! A document's later pages are written before page 1. In place, page 1
//! replaces the document and drops its container, so it only lands once
//! every other page is safely on disk; a failed run can simply be repeated.
//!
//! A generated page can land on the path of a file that already exists in
//! the source. When copying out, the source file wins and the document is
//! passed through with a warning. In place, the file can only be the output
//! of an earlier run, and the new page replaces it.
//!
//! Documents are independent, so processing is a parallel map over the
//! walked entries. Each worker owns its document from read to write and
//! returns a [`FileReport`]; the reports are folded into the [`RunSummary`]
//! once the map is done, so no counters are shared between threads.

use crate::engine::{DocumentTransform, ParseWarning, Transformed};
use crate::summary::{FileError, FileOutcome, FileReport, RunSummary, WriteCounts};
use crate::walk::{self, EntryKind, SourceEntry, SourceTree, WalkError};
use crate::writer::{OutputWriter, WriteMode};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Problems with the roots themselves. These end the run.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("source directory {} does not exist: {source}", .path.display())]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source {} is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error("source directory {} is not readable: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("output directory {} is not writable: {source}", .path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Walk(#[from] WalkError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Walking,
    Processing,
    Reporting,
    Done,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Canonical roots and the write mode they imply.
struct Roots {
    source: PathBuf,
    output: PathBuf,
    mode: WriteMode,
}

pub struct Pipeline {
    options: RunOptions,
    stage: Stage,
}

impl Pipeline {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run once over the source tree.
    ///
    /// Per-file problems are recorded in the summary; only a [`SetupError`]
    /// is returned as an error.
    pub fn run<T: DocumentTransform>(&mut self, transform: &T) -> Result<RunSummary, SetupError> {
        let result = self.execute(transform);
        self.advance(Stage::Done);
        result
    }

    fn execute<T: DocumentTransform>(&mut self, transform: &T) -> Result<RunSummary, SetupError> {
        let start = Instant::now();
        let roots = resolve_roots(&self.options)?;

        self.advance(Stage::Walking);
        let exclude = (roots.mode == WriteMode::CopyOut && roots.output.starts_with(&roots.source))
            .then_some(roots.output.as_path());
        let tree = walk::walk(&roots.source, exclude)?;

        self.advance(Stage::Processing);
        debug!("processing {} files ({} documents)", tree.len(), tree.html_count());
        let writer = OutputWriter::new(&roots.output, roots.mode);
        let reports: Vec<FileReport> = tree
            .entries()
            .par_iter()
            .map(|entry| process_entry(&tree, entry, &writer, transform))
            .collect();

        self.advance(Stage::Reporting);
        let mut summary = RunSummary::new(roots.mode);
        summary.walk_warnings = tree.warnings().to_vec();
        for report in reports {
            summary.record(report);
        }
        summary.elapsed = start.elapsed();
        info!("{summary}");

        Ok(summary)
    }

    fn advance(&mut self, next: Stage) {
        debug!("pipeline stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

fn resolve_roots(options: &RunOptions) -> Result<Roots, SetupError> {
    let source = fs::canonicalize(&options.source).map_err(|e| SetupError::SourceMissing {
        path: options.source.clone(),
        source: e,
    })?;
    if !source.is_dir() {
        return Err(SetupError::SourceNotDirectory(options.source.clone()));
    }
    fs::read_dir(&source).map_err(|e| SetupError::SourceUnreadable {
        path: options.source.clone(),
        source: e,
    })?;

    let output_error = |e| SetupError::OutputUnwritable {
        path: options.output.clone(),
        source: e,
    };
    fs::create_dir_all(&options.output).map_err(output_error)?;
    let output = fs::canonicalize(&options.output).map_err(output_error)?;
    NamedTempFile::new_in(&output).map_err(output_error)?;

    let mode = if source == output {
        WriteMode::InPlace
    } else {
        WriteMode::CopyOut
    };
    debug!(
        "source {} output {} ({:?})",
        source.display(),
        output.display(),
        mode
    );
    Ok(Roots {
        source,
        output,
        mode,
    })
}

fn process_entry<T: DocumentTransform>(
    tree: &SourceTree,
    entry: &SourceEntry,
    writer: &OutputWriter,
    transform: &T,
) -> FileReport {
    let mut writes = WriteCounts::default();
    let outcome = match handle(tree, entry, writer, transform, &mut writes) {
        Ok(outcome) => outcome,
        Err((path, err)) => {
            error!("Failed to process {}: {}", path.display(), err);
            FileOutcome::Failed(FileError::new(path, err))
        }
    };
    FileReport {
        relative: entry.relative.clone(),
        outcome,
        writes,
    }
}

/// Process one entry. An error carries the path that failed.
fn handle<T: DocumentTransform>(
    tree: &SourceTree,
    entry: &SourceEntry,
    writer: &OutputWriter,
    transform: &T,
    writes: &mut WriteCounts,
) -> Result<FileOutcome, (PathBuf, io::Error)> {
    let source = tree.path_of(entry);
    let relative = entry.relative.as_path();
    let at_source = |e| (source.clone(), e);

    if entry.kind == EntryKind::Asset {
        writes.record(writer.copy(&source, relative).map_err(at_source)?);
        return Ok(FileOutcome::Skipped(None));
    }

    let bytes = fs::read(&source).map_err(at_source)?;
    let original = Original {
        relative,
        bytes: &bytes,
        source: &source,
    };
    match transform.transform(relative, &bytes) {
        Transformed::Paginated(pages) => {
            let Some((first, later)) = pages.split_first() else {
                original.keep(writer, writes)?;
                return Ok(FileOutcome::Processed { pages: 0 });
            };
            let collision = (writer.mode() == WriteMode::CopyOut)
                .then(|| later.iter().find(|page| tree.contains(&page.relative)))
                .flatten();
            if let Some(page) = collision {
                let warning = ParseWarning::PageCollision(page.relative.clone());
                return original.pass_through(warning, writer, writes);
            }
            for page in later.iter().chain([first]) {
                let status = writer
                    .write(&page.relative, &page.bytes, &source)
                    .map_err(|e| (writer.destination(&page.relative), e))?;
                writes.record(status);
            }
            Ok(FileOutcome::Processed { pages: pages.len() })
        }
        Transformed::Untouched => {
            original.keep(writer, writes)?;
            Ok(FileOutcome::Processed { pages: 0 })
        }
        Transformed::Passthrough(warning) => original.pass_through(warning, writer, writes),
    }
}

/// A document's bytes as read from the source.
struct Original<'a> {
    relative: &'a Path,
    bytes: &'a [u8],
    source: &'a Path,
}

impl Original<'_> {
    /// Mirror the original bytes. In place there is nothing to do.
    fn keep(&self, writer: &OutputWriter, writes: &mut WriteCounts) -> Result<(), (PathBuf, io::Error)> {
        if writer.mode() == WriteMode::CopyOut {
            let status = writer
                .write(self.relative, self.bytes, self.source)
                .map_err(|e| (writer.destination(self.relative), e))?;
            writes.record(status);
        }
        Ok(())
    }

    fn pass_through(
        &self,
        warning: ParseWarning,
        writer: &OutputWriter,
        writes: &mut WriteCounts,
    ) -> Result<FileOutcome, (PathBuf, io::Error)> {
        warn!("Passing {} through unchanged: {}", self.relative.display(), warning);
        self.keep(writer, writes)?;
        Ok(FileOutcome::Skipped(Some(warning)))
    }
}
