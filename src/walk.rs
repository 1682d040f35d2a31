//! Source tree discovery.
//!
//! [`walk`] takes a snapshot of every regular file under the source root,
//! sorted by relative path. The snapshot is plain data: the pipeline can
//! iterate it as often as it needs and it never changes under a run, even if
//! files are added or removed while pages are being written.
//!
//! Symlinks are followed. A link pointing back at one of its own ancestors is
//! reported and skipped rather than walked forever; so is any entry that
//! cannot be read. Only a problem with the root itself fails the walk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("cannot read source directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// An entry that was skipped while walking.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}: {message}", .path.display())]
pub struct WalkWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Html,
    Asset,
}

impl EntryKind {
    /// `.html` and `.htm` files, in any case, are documents.
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
                EntryKind::Html
            }
            _ => EntryKind::Asset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    /// Path relative to the source root.
    pub relative: PathBuf,
    pub kind: EntryKind,
}

/// Every file found under a source root, in lexical path order.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    entries: Vec<SourceEntry>,
    warnings: Vec<WalkWarning>,
}

impl SourceTree {
    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn html_count(&self) -> usize {
        self.entries.iter().filter(|e| e.kind == EntryKind::Html).count()
    }

    /// Whether a file was found at `relative`.
    pub fn contains(&self, relative: &Path) -> bool {
        self.entries
            .binary_search_by(|entry| entry.relative.as_path().cmp(relative))
            .is_ok()
    }

    pub fn warnings(&self) -> &[WalkWarning] {
        &self.warnings
    }

    /// Absolute path of an entry.
    pub fn path_of(&self, entry: &SourceEntry) -> PathBuf {
        self.root.join(&entry.relative)
    }
}

impl<'a> IntoIterator for &'a SourceTree {
    type Item = &'a SourceEntry;
    type IntoIter = std::slice::Iter<'a, SourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Walk `root`, skipping the subtree at `exclude` if it lies inside it.
pub fn walk(root: &Path, exclude: Option<&Path>) -> Result<SourceTree, WalkError> {
    let meta = fs::metadata(root).map_err(|source| WalkError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(WalkError::NotADirectory(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| exclude.is_none_or(|excluded| e.path() != excluded));

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                if err.depth() == 0 {
                    let message = err.to_string();
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other(message));
                    return Err(WalkError::Io { path, source });
                }
                let message = match err.loop_ancestor() {
                    Some(ancestor) => format!("symlink cycle back to {}", ancestor.display()),
                    None => err.to_string(),
                };
                warn!("Skipping {}: {}", path.display(), message);
                warnings.push(WalkWarning { path, message });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            if !entry.file_type().is_dir() {
                debug!("ignoring special file {}", entry.path().display());
            }
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        entries.push(SourceEntry {
            kind: EntryKind::of(relative),
            relative: relative.to_path_buf(),
        });
    }

    entries.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(
        "walked {}: {} files, {} warnings",
        root.display(),
        entries.len(),
        warnings.len()
    );

    Ok(SourceTree {
        root: root.to_path_buf(),
        entries,
        warnings,
    })
}
