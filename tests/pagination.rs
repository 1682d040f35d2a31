//! End-to-end pagination scenarios: write a site, run pagebreak, inspect pages.

mod common;

use common::Site;
use pagebreak::engine::EngineOptions;
use pagebreak::paginate::PaginationDefaults;

fn posts(count: usize) -> String {
    (1..=count)
        .map(|n| format!("<p>Post {n}</p>"))
        .collect::<Vec<_>>()
        .join("\n            ")
}

// =========================================================================
// Page files
// =========================================================================

#[test]
fn paginates_root_document() {
    let site = Site::new();
    site.write_body(
        "index.html",
        &format!("<section data-pagebreak=\"2\">\n            {}\n        </section>", posts(5)),
    );

    let summary = site.run();

    assert_eq!(summary.paginated, 1);
    assert_eq!(summary.pages, 3);
    assert!(site.read_output("index.html").contains("<p>Post 1</p>"));
    assert!(site.read_output("index.html").contains("<p>Post 2</p>"));
    assert!(!site.read_output("index.html").contains("<p>Post 3</p>"));
    assert!(site.read_output("page/2/index.html").contains("<p>Post 3</p>"));
    assert!(site.read_output("page/2/index.html").contains("<p>Post 4</p>"));
    assert!(site.read_output("page/3/index.html").contains("<p>Post 5</p>"));
    assert!(!site.output_exists("page/4/index.html"));
}

#[test]
fn paginates_nested_documents() {
    let site = Site::new();
    site.write_body(
        "blog/index.html",
        &format!("<section data-pagebreak=\"1\">{}</section>", posts(2)),
    );
    site.write_body(
        "blog/archive.html",
        &format!("<section data-pagebreak=\"1\">{}</section>", posts(2)),
    );

    site.run();

    assert!(site.read_output("blog/page/2/index.html").contains("<p>Post 2</p>"));
    assert!(site.read_output("blog/archive/page/2/index.html").contains("<p>Post 2</p>"));
}

#[test]
fn single_page_documents_gain_no_pages() {
    let site = Site::new();
    site.write_body(
        "index.html",
        &format!("<section data-pagebreak=\"10\">{}</section>", posts(3)),
    );

    let summary = site.run();

    assert_eq!(summary.paginated, 0);
    assert!(!site.output().join("page").exists());
    assert!(!site.read_output("index.html").contains("data-pagebreak"));
}

#[test]
fn custom_page_url() {
    let site = Site::new();
    site.write_body(
        "blog/index.html",
        &format!(
            "<section data-pagebreak=\"1\" data-pagebreak-url=\"./archive/:num/\">{}</section>",
            posts(2)
        ),
    );

    site.run();

    assert!(site.output_exists("blog/archive/2/index.html"));
    assert!(!site.output_exists("blog/page/2/index.html"));
}

#[test]
fn root_relative_page_url() {
    let site = Site::new();
    site.write_body(
        "blog/index.html",
        &format!(
            "<section data-pagebreak=\"1\" data-pagebreak-url=\"/older/:num/\">{}</section>\
             <a href=\"#\" data-pagebreak-control=\"next\">Next</a>",
            posts(2)
        ),
    );

    site.run();

    assert!(site.output_exists("older/2/index.html"));
    assert!(site.read_output("blog/index.html").contains(r#"<a href="../older/2/">Next</a>"#));
}

#[test]
fn configured_defaults_apply_to_bare_containers() {
    let site = Site::new();
    site.write_body(
        "index.html",
        &format!("<section data-pagebreak>{}</section>", posts(6)),
    );
    let options = EngineOptions {
        pagination: PaginationDefaults {
            per_page: 3,
            url_format: "./p/:num/".to_string(),
            ..PaginationDefaults::default()
        },
        ..EngineOptions::default()
    };

    site.run_with(options, &site.output()).unwrap();

    assert!(site.read_output("p/2/index.html").contains("<p>Post 6</p>"));
    assert!(!site.output_exists("p/3/index.html"));
}

// =========================================================================
// Controls and labels
// =========================================================================

#[test]
fn next_and_previous_controls() {
    let site = Site::new();
    site.write_body(
        "index.html",
        &format!(
            "<section data-pagebreak=\"1\">{}</section>\
             <a href=\"#\" data-pagebreak-control=\"prev\">Previous</a>\
             <a href=\"#\" data-pagebreak-control=\"next\">Next</a>",
            posts(3)
        ),
    );

    site.run();

    let first = site.read_output("index.html");
    assert!(!first.contains("Previous"));
    assert!(first.contains(r#"<a href="page/2/">Next</a>"#));

    let second = site.read_output("page/2/index.html");
    assert!(second.contains(r#"<a href="../../">Previous</a>"#));
    assert!(second.contains(r#"<a href="../3/">Next</a>"#));

    let third = site.read_output("page/3/index.html");
    assert!(third.contains(r#"<a href="../2/">Previous</a>"#));
    assert!(!third.contains("Next"));
}

#[test]
fn negated_controls_only_show_at_the_ends() {
    let site = Site::new();
    site.write_body(
        "index.html",
        &format!(
            "<section data-pagebreak=\"1\">{}</section>\
             <span data-pagebreak-control=\"!prev\">At the start</span>\
             <span data-pagebreak-control=\"!next\">At the end</span>",
            posts(3)
        ),
    );

    site.run();

    let first = site.read_output("index.html");
    assert!(first.contains("At the start"));
    assert!(!first.contains("At the end"));

    let second = site.read_output("page/2/index.html");
    assert!(!second.contains("At the start"));
    assert!(!second.contains("At the end"));

    let third = site.read_output("page/3/index.html");
    assert!(!third.contains("At the start"));
    assert!(third.contains("At the end"));
}

#[test]
fn labels_show_current_and_total() {
    let site = Site::new();
    site.write_body(
        "index.html",
        &format!(
            "<section data-pagebreak=\"2\">{}</section>\
             <p>Page <b data-pagebreak-label=\"current\">x</b> of <b data-pagebreak-label=\"total\">y</b></p>",
            posts(5)
        ),
    );

    site.run();

    assert!(site.read_output("index.html").contains("<p>Page <b>1</b> of <b>3</b></p>"));
    assert!(site.read_output("page/2/index.html").contains("<p>Page <b>2</b> of <b>3</b></p>"));
    assert!(site.read_output("page/3/index.html").contains("<p>Page <b>3</b> of <b>3</b></p>"));
}

#[test]
fn controls_with_custom_url_between_subdirectories() {
    let site = Site::new();
    site.write_body(
        "file/main/index.html",
        &format!(
            "<section data-pagebreak=\"1\" data-pagebreak-url=\"../pages/:num/page/\">{}</section>\
             <a href=\"#\" data-pagebreak-control=\"prev\">Previous</a>\
             <a href=\"#\" data-pagebreak-control=\"next\">Next</a>",
            posts(3)
        ),
    );

    site.run();

    assert!(site
        .read_output("file/main/index.html")
        .contains(r#"<a href="../pages/2/page/">Next</a>"#));
    let second = site.read_output("file/pages/2/page/index.html");
    assert!(second.contains(r#"<a href="../../../main/">Previous</a>"#));
    assert!(second.contains(r#"<a href="../../3/page/">Next</a>"#));
}

// =========================================================================
// Head and links
// =========================================================================

#[test]
fn titles_on_later_pages() {
    let site = Site::new();
    site.write(
        "index.html",
        &format!(
            "<!DOCTYPE html><html><head><title>Journal</title></head>\
             <body><section data-pagebreak=\"1\" data-pagebreak-meta=\":content (page :num)\">{}</section></body></html>",
            posts(2)
        ),
    );

    site.run();

    assert!(site.read_output("index.html").contains("<title>Journal</title>"));
    assert!(site
        .read_output("page/2/index.html")
        .contains("<title>Journal (page 2)</title>"));
}

#[test]
fn links_on_later_pages_point_back_to_the_same_targets() {
    let site = Site::new();
    site.write(
        "index.html",
        &format!(
            "<!DOCTYPE html><html><head><link rel=\"stylesheet\" href=\"css/site.css\"></head>\
             <body><a href=\"about/\">About</a><a href=\"mailto:me@example.com\">Mail</a>\
             <section data-pagebreak=\"1\">{}</section></body></html>",
            posts(2)
        ),
    );

    site.run();

    let second = site.read_output("page/2/index.html");
    assert!(second.contains(r#"href="../../css/site.css""#));
    assert!(second.contains(r#"href="../../about/""#));
    assert!(second.contains(r#"href="mailto:me@example.com""#));
}

// =========================================================================
// Fixture site
// =========================================================================

#[test]
fn fixture_site_end_to_end() {
    let site = Site::from_fixtures();

    let summary = site.run();

    assert!(summary.is_complete());
    assert_eq!(summary.failed, 0);
    assert!(summary.warnings.is_empty(), "{:?}", summary.warnings);
    assert_eq!(summary.paginated, 2);
    assert_eq!(summary.pages, 5);

    let home = site.read_output("index.html");
    assert!(home.contains("First light"));
    assert!(home.contains("Second wind"));
    assert!(!home.contains("Third time"));
    assert!(home.contains("Newest"));
    assert!(!home.contains("Newer"));
    assert!(home.contains(r#"<a href="page/2/">Older</a>"#));

    let second = site.read_output("page/2/index.html");
    assert!(second.contains("<title>Field Notes | Page 2</title>"));
    assert!(second.contains(r#"href="../../assets/style.css""#));
    assert!(second.contains(r#"href="../../posts/third.html""#));
    assert!(second.contains(r#"href="https://example.com/page/2/""#));
    assert!(second.contains("Page <span>2</span> of <span>3</span>"));

    let last = site.read_output("page/3/index.html");
    assert!(last.contains("Fifth season"));
    assert!(last.contains("Oldest"));
    assert!(!last.contains("Older<"));

    let archive = site.read_output("posts/2/index.html");
    assert!(archive.contains("<title>Archive, page 2</title>"));
    assert!(archive.contains(r#"<a href="../fourth.html">Fourth</a>"#));
    assert!(archive.contains(r#"<a href="../">Previous</a>"#));

    assert_eq!(site.read_output("about/index.html"), site.read_source("about/index.html"));
}
