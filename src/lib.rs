//! # folio
//!
//! Turn one long published HTML page into a sectioned EPUB.
//!
//! ## Features
//!
//! - Split a container's children into chapters on a heading tag
//! - Keep fragment links working across the split (`#id` → `file.xhtml#id`)
//! - Move the page footer, with a source attribution, onto the title page
//! - Package the result as EPUB 3 with an EPUB 2 NCX fallback
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{BuildConfig, Source, pipeline};
//!
//! let config = BuildConfig::default();
//! let source = Source::Url(config.source_url.clone());
//! pipeline::run(&config, &source).unwrap();
//! ```
//!
//! ## Working with Sections
//!
//! The stages are usable on their own:
//!
//! ```
//! use folio::dom::{Matcher, find_first, parse_html};
//! use folio::links::rewrite_links;
//! use folio::render::render_sections;
//! use folio::section::{SectionOptions, sectionize};
//!
//! let mut dom = parse_html(br##"<div class="c">
//!     <p><a href="#b">next</a></p>
//!     <h2>Basics</h2><p id="b">b</p>
//! </div>"##).unwrap();
//! let container = find_first(&dom, dom.document(), &Matcher::tag("div")).unwrap();
//!
//! let sectioned = sectionize(&dom, container, None, &SectionOptions::default()).unwrap();
//! rewrite_links(&mut dom, &sectioned.sections, &sectioned.links);
//! let rendered = render_sections(&dom, &sectioned.sections).unwrap();
//!
//! assert_eq!(rendered[1].filename, "basics.xhtml");
//! assert!(rendered[0].content.contains(r#"href="basics.xhtml#b""#));
//! ```

pub mod book;
pub mod config;
pub mod dom;
pub mod epub;
pub mod error;
pub mod fetch;
pub mod footer;
pub mod links;
pub mod pipeline;
pub mod render;
pub mod section;
pub(crate) mod util;

pub use book::{Book, Metadata, Resource, SpineItem, TocEntry};
pub use config::BuildConfig;
pub use epub::{write_epub, write_epub_to_writer};
pub use error::{Error, Result, Stage};
pub use fetch::Source;
pub use links::{DanglingLink, LinkMap, RewriteReport};
pub use section::{Section, Sectioned};
