//! HTML transform engine: parse, paginate, serialize.
//!
//! The engine never fails a run. Every document ends in exactly one
//! [`Transformed`] value, and anything it cannot handle safely comes back as
//! [`Transformed::Passthrough`] so the original bytes are kept.
//!
//! Documents that do not mention `data-pagebreak` at all are not parsed;
//! most of a generated site is left alone without paying for a DOM.
//!
//! ## Strict parsing
//!
//! html5ever recovers from every error, but some recoveries move nodes
//! around, and paginating a tree that differs from what the author wrote
//! would scatter items. In strict mode a document passes through when the
//! parser reports an error that changes the tree. These are tolerated, since
//! the tree comes out the same as the author intended:
//!
//! | Parser message | Typical cause |
//! |----------------|---------------|
//! | `Unexpected token ... in insertion mode Initial` | no `<!DOCTYPE>` |
//! | `Bad DOCTYPE` | legacy or quirks doctype |
//! | `Duplicate attribute` | an attribute repeated on one tag (the first wins) |
//! | `No <p> tag to close` | a stray `</p>` |

use crate::paginate::{CONTAINER_ATTR, PaginationDefaults, PaginationError, Paginator, RenderedPage};
use html5ever::tree_builder::TreeBuilderOpts;
use kuchikiki::traits::TendrilSink;
use kuchikiki::{NodeRef, ParseOpts};
use std::borrow::Cow;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a document was passed through unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarning {
    #[error("document is not valid UTF-8")]
    InvalidUtf8,
    #[error("malformed markup: {first} ({count} parse errors)")]
    Malformed { count: usize, first: String },
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("could not serialize document: {0}")]
    Serialize(String),
    #[error("page {} would overwrite a file of the source site", .0.display())]
    PageCollision(PathBuf),
}

/// Outcome of running the engine over one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    /// Nothing to paginate; the source bytes stand as they are.
    Untouched,
    /// Page 1 (at the document's own path) followed by every later page.
    Paginated(Vec<RenderedPage>),
    /// The document could not be processed; the source bytes stand.
    Passthrough(ParseWarning),
}

/// A document rewriting pass, as seen by the pipeline.
///
/// Implementations must be deterministic and must not depend on other
/// documents: the pipeline calls them from several threads at once.
pub trait DocumentTransform: Sync {
    fn transform(&self, relative: &Path, source: &[u8]) -> Transformed;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Pass documents with structural parse errors through untouched.
    pub strict: bool,
    pub pagination: PaginationDefaults,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: true,
            pagination: PaginationDefaults::default(),
        }
    }
}

/// The pagination engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }
}

impl DocumentTransform for Engine {
    fn transform(&self, relative: &Path, source: &[u8]) -> Transformed {
        if !has_marker(source) {
            return Transformed::Untouched;
        }
        let Ok(text) = std::str::from_utf8(source) else {
            return Transformed::Passthrough(ParseWarning::InvalidUtf8);
        };

        let (document, errors) = parse(text);

        let mut paginator = match Paginator::hydrate(document, relative, &self.options.pagination) {
            Ok(Some(paginator)) => paginator,
            Ok(None) => return Transformed::Untouched,
            Err(err) => return Transformed::Passthrough(err.into()),
        };

        if let Some(first) = errors.first() {
            if self.options.strict {
                return Transformed::Passthrough(ParseWarning::Malformed {
                    count: errors.len(),
                    first: first.clone(),
                });
            }
            debug!(
                path = %relative.display(),
                count = errors.len(),
                "continuing past parse errors: {first}"
            );
        }

        info!(
            "Found {} items on {}; building {} pages of size {}",
            paginator.item_count(),
            relative.display(),
            paginator.page_count(),
            paginator.per_page()
        );

        match paginator.render() {
            Ok(pages) => Transformed::Paginated(pages),
            Err(err) => Transformed::Passthrough(ParseWarning::Serialize(err.to_string())),
        }
    }
}

/// Whether the raw bytes mention the pagination attribute anywhere.
pub fn has_marker(source: &[u8]) -> bool {
    let marker = CONTAINER_ATTR.as_bytes();
    source.windows(marker.len()).any(|window| window == marker)
}

/// Parse a document, collecting the parser's structural error messages.
fn parse(text: &str) -> (NodeRef, Vec<String>) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let options = ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: true,
            ..TreeBuilderOpts::default()
        },
        on_parse_error: Some(Box::new(move |message: Cow<'static, str>| {
            if !is_cosmetic(&message) {
                sink.borrow_mut().push(message.into_owned());
            }
        })),
        ..ParseOpts::default()
    };
    let document = kuchikiki::parse_html_with_options(options).one(text);
    let errors = errors.take();
    (document, errors)
}

/// Parse errors whose recovery leaves the tree as written.
fn is_cosmetic(message: &str) -> bool {
    message.ends_with("in insertion mode Initial")
        || message.starts_with("Bad DOCTYPE")
        || message == "Duplicate attribute"
        || message == "No <p> tag to close"
}
