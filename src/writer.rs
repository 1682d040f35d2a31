//! Whole-file writes into the destination tree.
//!
//! Every write goes through a temporary file created next to its target and
//! is then renamed over it, so a reader of the output tree sees either the old
//! file or the new one and never a truncated mix. Targets whose bytes already
//! match are left alone, which keeps modification times stable for tools that
//! sync or cache the built site.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// How the destination relates to the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The destination is a separate tree that mirrors the whole source.
    CopyOut,
    /// The destination is the source tree itself; only generated content is written.
    InPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// The target already held exactly these bytes.
    Unchanged,
}

/// Writes files below a destination root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
    mode: WriteMode,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Absolute target path for a relative output path.
    pub fn destination(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `bytes` to `relative`, taking permissions from the file at `like`.
    pub fn write(&self, relative: &Path, bytes: &[u8], like: &Path) -> io::Result<WriteStatus> {
        let dest = self.destination(relative);
        if matches_existing(&dest, bytes)? {
            return Ok(WriteStatus::Unchanged);
        }

        let parent = dest.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        let permissions = fs::metadata(like)?.permissions();
        fs::set_permissions(tmp.path(), permissions)?;
        tmp.persist(&dest).map_err(|e| e.error)?;
        Ok(WriteStatus::Written)
    }

    /// Mirror a source file verbatim. In place this is a no-op.
    pub fn copy(&self, source: &Path, relative: &Path) -> io::Result<WriteStatus> {
        match self.mode {
            WriteMode::InPlace => Ok(WriteStatus::Unchanged),
            WriteMode::CopyOut => {
                let bytes = fs::read(source)?;
                self.write(relative, &bytes, source)
            }
        }
    }
}

/// Whether `path` is a file holding exactly `bytes`.
fn matches_existing(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == bytes.len() as u64 => {
            Ok(fs::read(path)? == bytes)
        }
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
