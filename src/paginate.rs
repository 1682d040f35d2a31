//! The page-break pass: split a container's children across several pages.
//!
//! A document opts in by marking one element as the pagination container:
//!
//! ```html
//! <section data-pagebreak="2" data-pagebreak-url="./page/:num/">
//!     <article>One</article>
//!     <article>Two</article>
//!     <article>Three</article>
//! </section>
//! <a href="#" data-pagebreak-control="prev">Previous</a>
//! <span data-pagebreak-label="current"></span> / <span data-pagebreak-label="total"></span>
//! <a href="#" data-pagebreak-control="next">Next</a>
//! ```
//!
//! The container's element children are the items. Each page keeps the whole
//! document around them and only swaps the container contents, so headers,
//! footers and navigation survive untouched. Page 1 replaces the source
//! document; later pages are written to the paths resolved by
//! [`crate::urls::page_path`].
//!
//! ## Attributes
//!
//! | Attribute | Meaning |
//! |-----------|---------|
//! | `data-pagebreak` | Items per page (empty = configured default) |
//! | `data-pagebreak-url` | Page URL format, `:num` is the page number |
//! | `data-pagebreak-meta` | Title format for pages 2+, `:content` is the original title |
//! | `data-pagebreak-control` | `next`, `prev`, `!next`, `!prev` |
//! | `data-pagebreak-label` | `current` or `total` |
//!
//! All of them are stripped from the rendered pages. A rendered page therefore
//! contains no pagination markup and running the pass over it again is a no-op.
//!
//! ## Per-page rewrites
//!
//! Pages after the first live deeper in the tree than the source document, so
//! document-relative `href`s are rebased onto page 1, the `<title>` and social
//! titles get the meta format, and canonical URLs gain the page's own path.
//! Every rewrite is recorded and reverted after the page is serialized.

use crate::urls::{self, NUM_PLACEHOLDER, UrlError};
use kuchikiki::NodeRef;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Attribute marking the pagination container; its value is the page size.
pub const CONTAINER_ATTR: &str = "data-pagebreak";
const URL_ATTR: &str = "data-pagebreak-url";
const META_ATTR: &str = "data-pagebreak-meta";
const CONTROL_ATTR: &str = "data-pagebreak-control";
const LABEL_ATTR: &str = "data-pagebreak-label";

const CONTENT_PLACEHOLDER: &str = ":content";
const REL_FROM_PLACEHOLDER: &str = ":rel-from";
const REL_TO_PLACEHOLDER: &str = ":rel-to";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaginationError {
    #[error("invalid page size {0:?} on data-pagebreak")]
    InvalidPageSize(String),
    #[error("found {0} pagination containers, only one is supported per document")]
    MultipleContainers(usize),
    #[error("pagination URL {0:?} has no :num placeholder, every page would land on the same path")]
    MissingPlaceholder(String),
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// Values used when a container does not specify its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationDefaults {
    pub per_page: usize,
    pub url_format: String,
    pub meta_format: String,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            per_page: 2,
            url_format: "./page/:num/".to_string(),
            meta_format: ":content | Page :num".to_string(),
        }
    }
}

/// One serialized output page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Output path relative to the destination root.
    pub relative: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlKind {
    Next,
    Previous,
    NoNext,
    NoPrevious,
    Current,
    Total,
    Unknown,
}

impl ControlKind {
    fn control(value: &str) -> Self {
        match value.trim() {
            "next" => Self::Next,
            "prev" => Self::Previous,
            "!next" => Self::NoNext,
            "!prev" => Self::NoPrevious,
            _ => Self::Unknown,
        }
    }

    fn label(value: &str) -> Self {
        match value.trim() {
            "current" => Self::Current,
            "total" => Self::Total,
            _ => Self::Unknown,
        }
    }
}

/// A control or label element plus where to put it back after detaching it.
struct Control {
    node: NodeRef,
    parent: Option<NodeRef>,
    previous_sibling: Option<NodeRef>,
    kind: ControlKind,
}

/// A per-page rewrite and the value to restore afterwards.
enum Change {
    Text(NodeRef, String),
    Attribute(NodeRef, &'static str, String),
}

/// Placeholder values for one page.
struct PageContext {
    number: usize,
    rel_from: String,
    rel_to: String,
}

impl PageContext {
    fn resolve(&self, format: &str, content: &str) -> String {
        format
            .replace(NUM_PLACEHOLDER, &self.number.to_string())
            .replace(CONTENT_PLACEHOLDER, content)
            .replace(REL_FROM_PLACEHOLDER, &self.rel_from)
            .replace(REL_TO_PLACEHOLDER, &self.rel_to)
    }
}

/// Pagination state for one parsed document.
pub struct Paginator {
    document: NodeRef,
    container: NodeRef,
    items: Vec<NodeRef>,
    indentation: String,
    per_page: usize,
    meta_format: String,
    page_paths: Vec<PathBuf>,
    controls: Vec<Control>,
    changes: Vec<Change>,
}

impl Paginator {
    /// Read the pagination declaration out of `document`.
    ///
    /// Returns `Ok(None)` when the document has no container. Pagination
    /// attributes are removed from the tree as they are read.
    pub fn hydrate(
        document: NodeRef,
        relative: &Path,
        defaults: &PaginationDefaults,
    ) -> Result<Option<Self>, PaginationError> {
        let containers: Vec<NodeRef> = match document.select("[data-pagebreak]") {
            Ok(selection) => selection.map(|element| element.as_node().clone()).collect(),
            Err(()) => Vec::new(),
        };
        let container = match containers.as_slice() {
            [] => return Ok(None),
            [single] => single.clone(),
            several => return Err(PaginationError::MultipleContainers(several.len())),
        };

        let (per_page, url_format, meta_format) = read_container(&container, defaults)?;
        let (items, indentation) = collect_items(&container);

        let page_count = items.len().div_ceil(per_page).max(1);
        let page_paths = (0..page_count)
            .map(|index| urls::page_path(relative, &url_format, index))
            .collect::<Result<Vec<_>, _>>()?;

        let controls = collect_controls(&document, relative);

        Ok(Some(Self {
            document,
            container,
            items,
            indentation,
            per_page,
            meta_format,
            page_paths,
            controls,
            changes: Vec::new(),
        }))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn page_count(&self) -> usize {
        self.page_paths.len()
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Serialize every page of the document.
    pub fn render(&mut self) -> io::Result<Vec<RenderedPage>> {
        let mut pages = Vec::with_capacity(self.page_count());
        for index in 0..self.page_count() {
            self.fill_container(index);
            if index > 0 {
                let context = self.page_context(index);
                self.rewrite_meta(&context);
            }
            self.update_controls(index);

            let mut bytes = Vec::new();
            self.document.serialize(&mut bytes)?;
            pages.push(RenderedPage {
                relative: self.page_paths[index].clone(),
                bytes,
            });

            self.reattach_controls();
            self.revert_changes();
        }
        Ok(pages)
    }

    fn page_context(&self, index: usize) -> PageContext {
        let first = &self.page_paths[0];
        let current = &self.page_paths[index];
        PageContext {
            number: index + 1,
            rel_from: urls::relative_url(current, first),
            rel_to: urls::relative_url(first, current),
        }
    }

    fn fill_container(&self, index: usize) {
        for child in self.container.children().collect::<Vec<_>>() {
            child.detach();
        }

        let start = (index * self.per_page).min(self.items.len());
        let end = (start + self.per_page).min(self.items.len());
        for item in &self.items[start..end] {
            self.container.append(NodeRef::new_text(self.indentation.as_str()));
            self.container.append(item.clone());
        }
        self.container.append(NodeRef::new_text(self.indentation.as_str()));
    }

    fn rewrite_meta(&mut self, context: &PageContext) {
        let meta_format = self.meta_format.clone();
        self.rewrite_text("title", &meta_format, context);
        self.rewrite_attribute(r#"[property="og:title"]"#, "content", &meta_format, context, |_| true);
        self.rewrite_attribute(
            r#"[property="twitter:title"], [name="twitter:title"]"#,
            "content",
            &meta_format,
            context,
            |_| true,
        );
        self.rewrite_attribute("[href]", "href", ":rel-from:content", context, urls::is_document_relative);
        self.rewrite_attribute(r#"[rel="canonical"]"#, "href", ":content:rel-to", context, |_| true);
        self.rewrite_attribute(r#"[property="og:url"]"#, "content", ":content:rel-to", context, |_| true);
    }

    fn rewrite_text(&mut self, selector: &str, format: &str, context: &PageContext) {
        for node in select_nodes(&self.document, selector) {
            let original = node.text_contents();
            let resolved = context.resolve(format, &original);
            replace_text(&node, &resolved);
            self.changes.push(Change::Text(node, original));
        }
    }

    fn rewrite_attribute(
        &mut self,
        selector: &str,
        attribute: &'static str,
        format: &str,
        context: &PageContext,
        filter: impl Fn(&str) -> bool,
    ) {
        for node in select_nodes(&self.document, selector) {
            let Some(element) = node.as_element() else {
                continue;
            };
            let mut attributes = element.attributes.borrow_mut();
            let Some(original) = attributes.get(attribute).map(str::to_string) else {
                continue;
            };
            if !filter(&original) {
                continue;
            }
            attributes.insert(attribute, context.resolve(format, &original));
            drop(attributes);
            self.changes.push(Change::Attribute(node, attribute, original));
        }
    }

    fn update_controls(&self, index: usize) {
        let current = &self.page_paths[index];
        let last = self.page_count() - 1;

        self.set_text(ControlKind::Current, &(index + 1).to_string());
        self.set_text(ControlKind::Total, &self.page_count().to_string());

        if index == 0 {
            self.detach(ControlKind::Previous);
        } else {
            let href = urls::relative_url(current, &self.page_paths[index - 1]);
            self.set_href(ControlKind::Previous, &href);
            self.detach(ControlKind::NoPrevious);
        }

        if index == last {
            self.detach(ControlKind::Next);
        } else {
            let href = urls::relative_url(current, &self.page_paths[index + 1]);
            self.set_href(ControlKind::Next, &href);
            self.detach(ControlKind::NoNext);
        }
    }

    fn controls_of(&self, kind: ControlKind) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(move |control| control.kind == kind)
    }

    fn set_text(&self, kind: ControlKind, text: &str) {
        for control in self.controls_of(kind) {
            replace_text(&control.node, text);
        }
    }

    fn set_href(&self, kind: ControlKind, href: &str) {
        for control in self.controls_of(kind) {
            if let Some(element) = control.node.as_element() {
                element.attributes.borrow_mut().insert("href", href.to_string());
            }
        }
    }

    fn detach(&self, kind: ControlKind) {
        for control in self.controls_of(kind) {
            control.node.detach();
        }
    }

    fn reattach_controls(&self) {
        for control in &self.controls {
            if let Some(sibling) = &control.previous_sibling {
                sibling.insert_after(control.node.clone());
            } else if let Some(parent) = &control.parent {
                parent.prepend(control.node.clone());
            }
        }
    }

    fn revert_changes(&mut self) {
        for change in self.changes.drain(..).rev() {
            match change {
                Change::Text(node, original) => replace_text(&node, &original),
                Change::Attribute(node, attribute, original) => {
                    if let Some(element) = node.as_element() {
                        element.attributes.borrow_mut().insert(attribute, original);
                    }
                }
            }
        }
    }
}

fn read_container(
    container: &NodeRef,
    defaults: &PaginationDefaults,
) -> Result<(usize, String, String), PaginationError> {
    let Some(element) = container.as_element() else {
        return Ok((
            defaults.per_page,
            defaults.url_format.clone(),
            defaults.meta_format.clone(),
        ));
    };
    let mut attributes = element.attributes.borrow_mut();

    let per_page = match attributes.get(CONTAINER_ATTR).map(str::trim) {
        None | Some("") => defaults.per_page,
        Some(value) => value
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| PaginationError::InvalidPageSize(value.to_string()))?,
    };
    let url_format = attributes
        .get(URL_ATTR)
        .map(str::to_string)
        .unwrap_or_else(|| defaults.url_format.clone());
    if !url_format.contains(NUM_PLACEHOLDER) {
        return Err(PaginationError::MissingPlaceholder(url_format));
    }
    let meta_format = attributes
        .get(META_ATTR)
        .map(str::to_string)
        .unwrap_or_else(|| defaults.meta_format.clone());

    attributes.remove(CONTAINER_ATTR);
    attributes.remove(URL_ATTR);
    attributes.remove(META_ATTR);

    Ok((per_page, url_format, meta_format))
}

/// Element children of the container, and the whitespace to put between them.
///
/// The container's leading text node, if any, sets the indentation; other
/// text and comment nodes between items are dropped.
fn collect_items(container: &NodeRef) -> (Vec<NodeRef>, String) {
    let mut indentation = "\n".to_string();
    let mut items = Vec::new();
    for (position, child) in container.children().enumerate() {
        if let Some(text) = child.as_text() {
            if position == 0 {
                indentation = text.borrow().clone();
            }
        } else if child.as_element().is_some() {
            items.push(child);
        }
    }
    (items, indentation)
}

fn collect_controls(document: &NodeRef, relative: &Path) -> Vec<Control> {
    let mut controls = Vec::new();
    for node in select_nodes(document, "[data-pagebreak-control], [data-pagebreak-label]") {
        let Some(element) = node.as_element() else {
            continue;
        };
        let kind = {
            let mut attributes = element.attributes.borrow_mut();
            let kind = attributes
                .get(CONTROL_ATTR)
                .map(ControlKind::control)
                .or_else(|| attributes.get(LABEL_ATTR).map(ControlKind::label))
                .unwrap_or(ControlKind::Unknown);
            attributes.remove(CONTROL_ATTR);
            attributes.remove(LABEL_ATTR);
            kind
        };

        if kind == ControlKind::Unknown {
            debug!(path = %relative.display(), "ignoring unrecognised pagebreak control");
            continue;
        }

        controls.push(Control {
            parent: node.parent(),
            previous_sibling: node.previous_sibling(),
            node,
            kind,
        });
    }
    controls
}

fn select_nodes(document: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match document.select(selector) {
        Ok(selection) => selection.map(|element| element.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    }
}

fn replace_text(node: &NodeRef, text: &str) {
    for child in node.children().collect::<Vec<_>>() {
        child.detach();
    }
    node.append(NodeRef::new_text(text));
}
