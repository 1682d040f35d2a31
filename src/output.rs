//! CLI output formatting for a run.
//!
//! # Output Format
//!
//! ```text
//! Pagebreak: site → site (in place)
//! 14 files: 11 processed, 3 skipped, 0 failed
//! Paginated 2 documents into 7 pages
//! Wrote 5 files, 1 unchanged
//!
//! Warnings
//!     drafts/broken.html: malformed markup: Unexpected token (2 parse errors)
//!
//! Pagebreak: Finished in 0.042 seconds
//! ```
//!
//! The summary goes to stdout. Per-document detail (page counts, skipped
//! entries) is logged through `tracing` on stderr instead, so piping the
//! summary stays clean.
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` (or `String`) for
//! testability, with a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::summary::RunSummary;
use crate::writer::WriteMode;
use std::path::Path;
use std::time::Duration;

/// Seconds with millisecond precision, e.g. `1.005`.
pub fn format_duration(duration: Duration) -> String {
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

/// Closing line of every run.
pub fn format_finished(elapsed: Duration) -> String {
    format!("Pagebreak: Finished in {} seconds", format_duration(elapsed))
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Format a completed run.
pub fn format_summary(summary: &RunSummary, source: &Path, output: &Path) -> Vec<String> {
    let mode = match summary.mode {
        WriteMode::InPlace => "in place",
        WriteMode::CopyOut => "copy",
    };
    let mut lines = vec![
        format!("Pagebreak: {} → {} ({mode})", source.display(), output.display()),
        summary.to_string(),
    ];

    if summary.paginated > 0 {
        lines.push(format!(
            "Paginated {} into {}",
            plural(summary.paginated, "document", "documents"),
            plural(summary.pages, "page", "pages")
        ));
    }
    lines.push(format!(
        "Wrote {}, {} unchanged",
        plural(summary.files_written, "file", "files"),
        summary.files_unchanged
    ));

    if !summary.warnings.is_empty() || !summary.walk_warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for warning in &summary.walk_warnings {
            lines.push(format!("    {warning}"));
        }
        for (path, warning) in &summary.warnings {
            lines.push(format!("    {}: {warning}", path.display()));
        }
    }

    if !summary.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for failure in &summary.failures {
            lines.push(format!("    {failure}"));
        }
    }

    lines
}

pub fn print_summary(summary: &RunSummary, source: &Path, output: &Path) {
    for line in format_summary(summary, source, output) {
        println!("{}", line);
    }
}

pub fn print_finished(elapsed: Duration) {
    println!();
    println!("{}", format_finished(elapsed));
}
