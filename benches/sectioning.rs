//! Benchmarks for the sectioning pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;
use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use folio::config::BuildConfig;
use folio::dom::{Matcher, find_first, parse_html};
use folio::pipeline::{build_book, transform};
use folio::section::{SectionOptions, sectionize};
use folio::write_epub_to_writer;

/// A page shaped like Effective Go: ~60 chapters of prose, code and links.
fn synthetic_page(chapters: usize) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>Bench</title></head><body>\
         <div id=\"page\"><div class=\"container\"><h1>Bench</h1>",
    );
    for i in 0..chapters {
        html.push_str(&format!("<h2 id=\"ch{i}\">Chapter {i}</h2>"));
        for j in 0..20 {
            let target = (i * 7 + j) % chapters;
            html.push_str(&format!(
                "<p id=\"p{i}-{j}\">Paragraph {j} of chapter {i}, see \
                 <a href=\"#ch{target}\">chapter {target}</a>.</p>\
                 <pre>func f{j}() int {{\n\treturn {j} &lt; {i}\n}}</pre>"
            ));
        }
    }
    html.push_str(
        "<div id=\"footer\">Content of this page is licensed.<br>\
         <a href=\"#ch0\">Back to top</a></div></div></div></body></html>",
    );
    html
}

fn bench_pipeline(c: &mut Criterion) {
    let page = synthetic_page(60);
    let config = BuildConfig::default();

    c.bench_function("parse", |b| {
        b.iter(|| parse_html(black_box(page.as_bytes())).unwrap())
    });

    let dom = parse_html(page.as_bytes()).unwrap();
    let container =
        find_first(&dom, dom.document(), &Matcher::tag("div").with_class("container")).unwrap();
    let options = SectionOptions::default();
    c.bench_function("sectionize", |b| {
        b.iter(|| sectionize(black_box(&dom), container, None, &options).unwrap())
    });

    c.bench_function("transform", |b| {
        b.iter(|| transform(&config, black_box(page.as_bytes())).unwrap())
    });

    let (book, _) = build_book(&config, page.as_bytes()).unwrap();
    c.bench_function("write_epub", |b| {
        b.iter(|| {
            let mut out = Cursor::new(Vec::new());
            write_epub_to_writer(black_box(&book), &mut out).unwrap();
            out
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
