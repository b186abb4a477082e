//! The end-to-end build: source bytes in, EPUB out.
//!
//! Stages run strictly in sequence over one [`Dom`]: locate the container,
//! drop unwanted nodes, reformat the footer, split into sections, rewrite
//! fragment links, render, package. The first failing stage aborts the
//! build and nothing is written.

use crate::book::{Book, Metadata};
use crate::config::BuildConfig;
use crate::dom::{self, Dom, NodeId};
use crate::epub::write_epub;
use crate::error::{Error, Result};
use crate::fetch::Source;
use crate::footer::reformat_footer;
use crate::links::{RewriteReport, rewrite_links};
use crate::render::{RenderedSection, render_sections};
use crate::section::sectionize;

/// Result of turning a document into sections.
#[derive(Debug)]
pub struct Transformed {
    pub sections: Vec<RenderedSection>,
    pub report: RewriteReport,
}

/// Fetch (or read) the source, build the book, and write it to
/// `config.output_path`.
pub fn run(config: &BuildConfig, source: &Source) -> Result<RewriteReport> {
    config.validate()?;

    let bytes = source.load()?;
    let (book, report) = build_book(config, &bytes)?;
    // The response body is no longer needed once the book holds its markup.
    drop(bytes);

    write_epub(&book, &config.output_path)?;
    log::info!(
        "wrote {} ({} sections, {} dangling links)",
        config.output_path.display(),
        book.spine.len(),
        report.dangling.len()
    );
    Ok(report)
}

/// Build an in-memory [`Book`] from raw document bytes.
pub fn build_book(config: &BuildConfig, bytes: &[u8]) -> Result<(Book, RewriteReport)> {
    let Transformed { sections, report } = transform(config, bytes)?;

    let mut metadata = Metadata::new(config.title.clone()).with_language(config.language.clone());
    if let Some(author) = &config.author {
        metadata = metadata.with_author(author.clone());
    }
    if let Some(identifier) = &config.identifier {
        metadata = metadata.with_identifier(identifier.clone());
    }
    let mut book = Book::new(metadata);

    if let Some(cover) = &config.cover_image_path {
        book.set_cover(cover)?;
    }
    let stylesheet = config
        .stylesheet_path
        .as_deref()
        .map(|path| book.add_css(path))
        .transpose()?;
    for font in &config.font_paths {
        book.add_font(font)?;
    }

    for section in &sections {
        book.add_section(
            &section.content,
            &section.title,
            &section.filename,
            stylesheet.as_deref(),
        )?;
    }

    Ok((book, report))
}

/// Parse, sectionize, rewrite links, and render, without packaging.
pub fn transform(config: &BuildConfig, bytes: &[u8]) -> Result<Transformed> {
    let mut dom = dom::parse_html(bytes)?;
    log::debug!("parsed document into {} nodes", dom.len());

    let container = locate_container(&dom, config)?;

    for selector in &config.remove {
        match dom::remove(&mut dom, container, &selector.matcher()) {
            Some(_) => log::debug!("removed {selector}"),
            None => log::debug!("nothing to remove for {selector}"),
        }
    }

    let footer = match &config.footer {
        Some(selector) => {
            let footer = dom::find_first(&dom, container, &selector.matcher()).ok_or_else(|| {
                Error::StructureNotFound(format!("footer {selector} not found in container"))
            })?;
            Some(reformat_footer(&mut dom, footer, &config.source_url))
        }
        None => None,
    };

    let sectioned = sectionize(&dom, container, footer, &config.section_options())?;
    let report = rewrite_links(&mut dom, &sectioned.sections, &sectioned.links);

    let sections = render_sections(&dom, &sectioned.sections)?;
    Ok(Transformed { sections, report })
}

/// Apply the container selectors in turn, each searching inside the last.
fn locate_container(dom: &Dom, config: &BuildConfig) -> Result<NodeId> {
    let mut node = dom.document();
    for selector in &config.container {
        node = dom::find_first(dom, node, &selector.matcher()).ok_or_else(|| {
            Error::StructureNotFound(format!("container element {selector} not found"))
        })?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeSelector;

    const PAGE: &str = r##"<!DOCTYPE html>
<html><head><title>Effective Go</title></head>
<body>
<div id="topbar">nav</div>
<div id="page"><div class="container">
<p>Intro text, see <a href="#tips">tips</a>.</p>
<h2 id="intro">Intro</h2>
<p>Body <a href="#missing">gone</a></p>
<h2>Tips</h2>
<p id="tips">Use gofmt.</p>
<div id="footer">Back to page top<br></div>
</div></div>
</body></html>"##;

    fn config() -> BuildConfig {
        BuildConfig {
            source_url: "https://example.com/doc.html".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_transform_sections_and_links() {
        let out = transform(&config(), PAGE.as_bytes()).unwrap();

        let names: Vec<_> = out.sections.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(names, vec!["title.xhtml", "intro.xhtml", "tips.xhtml"]);

        let title = &out.sections[0].content;
        assert!(title.contains(r#"href="tips.xhtml#tips""#));
        assert!(title.contains("Back to book top"));
        assert!(title.contains(r#"Source: <a href="https://example.com/doc.html">"#));

        assert!(out.sections[1].content.contains(r##"href="#missing""##));
        assert!(!out.sections[2].content.contains("footer"));

        assert_eq!(out.report.rewritten, 1);
        assert_eq!(out.report.dangling.len(), 1);
        assert_eq!(out.report.dangling[0].section, "intro.xhtml");
    }

    #[test]
    fn test_missing_container() {
        let err = transform(&config(), b"<html><body><p>x</p></body></html>").unwrap_err();
        assert!(matches!(err, Error::StructureNotFound(_)));
        assert!(err.to_string().contains("div#page"));
    }

    #[test]
    fn test_missing_footer() {
        let html = r#"<div id="page"><div class="container"><h2>A</h2></div></div>"#;
        let err = transform(&config(), html.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::StructureNotFound(_)));

        let no_footer = BuildConfig {
            footer: None,
            ..config()
        };
        let out = transform(&no_footer, html.as_bytes()).unwrap();
        assert_eq!(out.sections.len(), 2);
    }

    #[test]
    fn test_remove_selectors() {
        let config = BuildConfig {
            remove: vec![NodeSelector::new("p", "id", "tips")],
            ..config()
        };
        let out = transform(&config, PAGE.as_bytes()).unwrap();
        assert!(!out.sections[2].content.contains("gofmt"));
        // The target is gone, so the link to it dangles.
        assert_eq!(out.report.dangling.len(), 2);
    }

    #[test]
    fn test_deeply_nested_page() {
        const DEPTH: usize = 20_000;
        let html = format!(
            r#"<div id="page"><div class="container"><h2>Deep</h2><div>{}x{}</div><div id="footer">f</div></div></div>"#,
            "<span>".repeat(DEPTH),
            "</span>".repeat(DEPTH)
        );
        let out = transform(&config(), html.as_bytes()).unwrap();

        assert_eq!(out.sections.len(), 2);
        assert_eq!(out.sections[1].content.matches("<span>").count(), DEPTH);
    }

    #[test]
    fn test_unparseable_input() {
        let err = transform(&config(), b"   ").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_build_book_spine_and_toc() {
        let (book, _) = build_book(&config(), PAGE.as_bytes()).unwrap();

        let spine: Vec<_> = book.spine.iter().map(|s| s.href.as_str()).collect();
        assert_eq!(spine, vec!["title.xhtml", "intro.xhtml", "tips.xhtml"]);
        let toc: Vec<_> = book.toc.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(toc, vec!["Intro", "Tips"]);
        assert_eq!(book.metadata.title, "Effective Go");
    }

    #[test]
    fn test_build_book_with_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("epub.css");
        std::fs::write(&css, "body { margin: 0 }").unwrap();

        let config = BuildConfig {
            stylesheet_path: Some(css),
            ..config()
        };
        let (book, _) = build_book(&config, PAGE.as_bytes()).unwrap();
        let doc = book.get_resource("intro.xhtml").unwrap();
        let doc = String::from_utf8_lossy(&doc.data);
        assert!(doc.contains(r#"href="css/epub.css""#));
    }

    #[test]
    fn test_run_writes_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.html");
        std::fs::write(&input, "<html><body></body></html>").unwrap();
        let output = dir.path().join("book.epub");

        let config = BuildConfig {
            output_path: output.clone(),
            ..config()
        };
        let err = run(&config, &Source::File(input)).unwrap_err();
        assert!(matches!(err, Error::StructureNotFound(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.html");
        std::fs::write(&input, PAGE).unwrap();
        let output = dir.path().join("book.epub");

        let config = BuildConfig {
            output_path: output.clone(),
            ..config()
        };
        let report = run(&config, &Source::File(input)).unwrap();
        assert_eq!(report.dangling.len(), 1);
        assert!(output.exists());
    }
}
