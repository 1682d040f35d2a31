//! Output paths and relative URLs for paginated pages.
//!
//! Page 1 of a document always keeps the document's own path. Every later
//! page is written as a directory index built from the container's URL
//! format, with `:num` replaced by the 1-based page number:
//!
//! ```text
//! index.html          + "./page/:num/"     → page/2/index.html
//! about/index.html    + "./page/:num/"     → about/page/2/index.html
//! posts/hello.html    + "./page/:num/"     → posts/hello/page/2/index.html
//! a/b/c/index.html    + "../../page/:num/" → a/page/2/index.html
//! blog/index.html     + "/archive/:num/"   → archive/2/index.html
//! ```
//!
//! Formats are resolved relative to the document's directory, except that a
//! leading `/` anchors them at the output root. The result is normalized
//! lexically and must stay inside the output root.

use lexiclean::Lexiclean;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Placeholder for the page number in URL and meta formats.
pub const NUM_PLACEHOLDER: &str = ":num";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UrlError {
    #[error("pagination URL {url:?} for page {page} resolves outside of the output directory")]
    OutsideOutput { url: String, page: usize },
}

/// Relative output path of page `page_index` (0-based) of `document`.
pub fn page_path(document: &Path, url_format: &str, page_index: usize) -> Result<PathBuf, UrlError> {
    if page_index == 0 {
        return Ok(document.to_path_buf());
    }

    let url = url_format.replace(NUM_PLACEHOLDER, &(page_index + 1).to_string());
    let joined = match url.strip_prefix('/') {
        Some(root_relative) => Path::new(root_relative).join("index.html"),
        None => {
            let base = document.parent().unwrap_or(Path::new(""));
            match document.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if stem != "index" => base.join(stem).join(&url).join("index.html"),
                _ => base.join(&url).join("index.html"),
            }
        }
    };

    let cleaned = joined.as_path().lexiclean();
    match cleaned.components().next() {
        Some(Component::Normal(_)) => Ok(cleaned),
        _ => Err(UrlError::OutsideOutput {
            url,
            page: page_index + 1,
        }),
    }
}

/// Directory URL leading from the page at `from` to the page at `to`.
///
/// Both arguments are relative output paths as produced by [`page_path`].
/// The result always ends in `/` and uses `/` separators.
pub fn relative_url(from: &Path, to: &Path) -> String {
    let from_dir = from.parent().unwrap_or(Path::new(""));
    let to_dir = to.parent().unwrap_or(Path::new(""));

    let diff = pathdiff::diff_paths(to_dir, from_dir).unwrap_or_else(|| to_dir.to_path_buf());
    let diff = diff.strip_prefix(".").map(Path::to_path_buf).unwrap_or(diff);

    let url = diff.to_string_lossy().replace('\\', "/");
    if url.is_empty() {
        "./".to_string()
    } else {
        format!("{url}/")
    }
}

/// Whether an `href` is relative to the current document's directory.
///
/// Absolute URLs, scheme URLs (`mailto:`, `tel:`), protocol-relative and
/// root-relative paths, fragments and empty values all resolve the same from
/// every page and must not be rebased.
pub fn is_document_relative(href: &str) -> bool {
    if href.is_empty() || href.starts_with('/') || href.starts_with('#') || href.starts_with('?') {
        return false;
    }
    !has_scheme(href)
}

fn has_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
