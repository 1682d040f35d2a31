//! # Pagebreak
//!
//! Framework agnostic pagination for static websites. Pagebreak runs after a
//! site generator has written its output and splits any element marked with
//! `data-pagebreak` across as many pages as its children need.
//!
//! ```html
//! <ul data-pagebreak="2" data-pagebreak-url="./page/:num/">
//!     <li>Post 1</li>
//!     <li>Post 2</li>
//!     <li>Post 3</li>
//! </ul>
//! <a data-pagebreak-control="next">Next</a>
//! ```
//!
//! Running `pagebreak -s _site -o _site` over a site whose `index.html`
//! contains the list above rewrites `index.html` with the first two posts and
//! adds `page/2/index.html` with the third, each with its controls pointing
//! at the neighbouring pages.
//!
//! # Architecture
//!
//! ```text
//! source/ ──walk──▶ SourceTree ──par_iter──▶ Engine ──▶ OutputWriter ──▶ output/
//!                                              │
//!                                       FileReport per file
//!                                              ▼
//!                                         RunSummary
//! ```
//!
//! [`pipeline::Pipeline`] drives a run. It takes a snapshot of the source
//! tree, hands every HTML document to a [`engine::DocumentTransform`] on the
//! rayon pool, and writes what comes back through an [`writer::OutputWriter`].
//! Each file produces exactly one [`summary::FileReport`]; the reports are
//! folded into a [`summary::RunSummary`] when the parallel map is done.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`walk`] | Lists every file under the source root, sorted, with symlink loop detection |
//! | [`engine`] | Parses a document, runs the paginator, falls back to passthrough |
//! | [`paginate`] | The pagination pass: containers, controls, labels, titles, links |
//! | [`urls`] | Output paths of generated pages and relative URLs between them |
//! | [`writer`] | Atomic, skip-if-identical file writes into the output tree |
//! | [`pipeline`] | Run state machine, root validation, parallel processing |
//! | [`summary`] | Per-file outcomes and run totals |
//! | [`config`] | Optional `pagebreak.toml` loading and validation |
//! | [`output`] | CLI output formatting of the run summary |
//!
//! # Design Decisions
//!
//! ## One Bad File Never Fails the Build
//!
//! Pagebreak is the last step of a build, so a run only fails when its roots
//! are unusable. A document with broken markup or an invalid pagination
//! declaration is copied through unchanged and reported as a warning; an I/O
//! error on one file is recorded and the rest of the site is still written.
//!
//! ## Strict Parsing by Default
//!
//! HTML parsers always produce a tree, even from garbage. Paginating that
//! recovered tree can silently move content around, so by default a document
//! with a parse error that changes its structure is left alone. Cosmetic
//! errors such as a missing DOCTYPE are tolerated. `--lenient` trusts the
//! recovered tree.
//!
//! ## Re-runs Are Free
//!
//! Every pagination attribute is removed from the pages written, so running
//! Pagebreak over its own output finds nothing to do. Files whose content has
//! not changed are not rewritten, leaving modification times alone.

pub mod config;
pub mod engine;
pub mod output;
pub mod paginate;
pub mod pipeline;
pub mod summary;
pub mod urls;
pub mod walk;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
