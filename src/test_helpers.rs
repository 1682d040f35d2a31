//! Shared test utilities for the pagebreak test suite.
//!
//! Compiled into the library's unit tests and, through `tests/common`, into
//! the integration tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_fixtures();
//! write_file(site.path(), "extra/index.html", &template_body("<p>hi</p>"));
//! let before = snapshot(site.path());
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// A temp directory holding a private copy of `fixtures/site/`.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_fixtures(tmp.path());
    tmp
}

/// Copy `fixtures/site/` into `dest`, which must exist.
pub fn copy_fixtures(dest: &Path) {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&fixtures).min_depth(1) {
        let entry = entry.unwrap();
        let target = dest.join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

// =========================================================================
// Files
// =========================================================================

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Read `root/relative` as a string. Panics with the path on failure.
pub fn read_file(root: &Path, relative: &str) -> String {
    let path = root.join(relative);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

/// Every file under `root`, keyed by `/`-separated relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap();
            let key = relative.to_string_lossy().replace('\\', "/");
            (key, fs::read(entry.path()).unwrap())
        })
        .collect()
}

// =========================================================================
// HTML
// =========================================================================

/// A minimal well-formed document with `body` inside `<body>`.
pub fn template_body(body: &str) -> String {
    format!(
        "\n<!DOCTYPE html>\n<html>\n    <head>\n    </head>\n    <body>\n        {body}\n    </body>\n</html>\n"
    )
}
