//! Property tests for sectioning and link rewriting over generated pages.

use folio::dom::{Dom, Matcher, NodeId, find_all, find_first, parse_html, serialize};
use folio::links::rewrite_links;
use folio::section::{SectionOptions, Sectioned, sectionize};
use proptest::prelude::*;

/// A generated container: `paras[0]` precede the first heading, `paras[i]`
/// follow heading `i`. The footer is inserted before child `footer_at`.
#[derive(Debug, Clone)]
struct Page {
    paras: Vec<usize>,
    footer_at: usize,
    /// Heading each paragraph's link points at (modulo heading count).
    link_seed: usize,
}

impl Page {
    fn headings(&self) -> usize {
        self.paras.len() - 1
    }

    fn html(&self) -> String {
        let mut children = Vec::new();
        for (section, &count) in self.paras.iter().enumerate() {
            if section > 0 {
                children.push(format!(
                    r#"<h2 id="s{section}">Section {section}</h2>"#
                ));
            }
            for p in 0..count {
                let link = if self.headings() > 0 {
                    let target = (self.link_seed + section + p) % self.headings() + 1;
                    format!(r##"<a href="#s{target}" class="x">see {target}</a>"##)
                } else {
                    String::new()
                };
                children.push(format!(
                    r#"<p id="p{section}-{p}">text{link}<br><img src="i.png" alt=""></p>"#
                ));
            }
        }
        let footer_at = self.footer_at.min(children.len());
        children.insert(
            footer_at,
            r#"<div id="footer">Back to page top<br><a href="/tos">tos</a></div>"#.to_string(),
        );
        format!(r#"<div class="container">{}</div>"#, children.concat())
    }
}

fn page() -> impl Strategy<Value = Page> {
    (
        prop::collection::vec(0usize..4, 1..8),
        0usize..40,
        0usize..10,
    )
        .prop_map(|(paras, footer_at, link_seed)| Page {
            paras,
            footer_at,
            link_seed,
        })
}

fn build(page: &Page) -> (Dom, NodeId, NodeId, Sectioned) {
    let dom = parse_html(page.html().as_bytes()).unwrap();
    let container = find_first(&dom, dom.document(), &Matcher::tag("div").with_class("container"))
        .unwrap();
    let footer = find_first(&dom, container, &Matcher::tag("div").with_id("footer")).unwrap();
    let sectioned = sectionize(&dom, container, Some(footer), &SectionOptions::default()).unwrap();
    (dom, container, footer, sectioned)
}

/// Tag names and attribute keys of every element, pre-order.
fn structure(dom: &Dom, root: NodeId) -> Vec<(String, Vec<String>)> {
    dom.descendants(root)
        .filter_map(|id| {
            let name = dom.element_name(id)?.to_string();
            let keys = dom
                .attrs(id)
                .iter()
                .map(|a| a.name.local.to_string())
                .collect();
            Some((name, keys))
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_n_boundaries_give_n_plus_one_sections(page in page()) {
        let (_, _, _, sectioned) = build(&page);

        prop_assert_eq!(sectioned.sections.len(), page.headings() + 1);
        prop_assert!(sectioned.sections[0].title.is_empty());
        prop_assert_eq!(sectioned.sections[0].filename.as_str(), "title.xhtml");
        for section in &sectioned.sections[1..] {
            prop_assert!(!section.title.is_empty());
        }
    }

    #[test]
    fn prop_every_child_in_exactly_one_section(page in page()) {
        let (dom, container, footer, sectioned) = build(&page);

        let mut claimed: Vec<NodeId> = sectioned
            .sections
            .iter()
            .flat_map(|s| s.nodes.iter().copied())
            .collect();
        let mut children: Vec<NodeId> = dom.children(container).collect();
        claimed.sort_by_key(|n| n.0);
        children.sort_by_key(|n| n.0);
        prop_assert_eq!(claimed, children);

        prop_assert!(sectioned.sections[0].nodes.contains(&footer));
        for section in &sectioned.sections[1..] {
            prop_assert!(!section.nodes.contains(&footer));
        }
    }

    #[test]
    fn prop_links_resolve_to_owning_section(page in page()) {
        let (mut dom, container, _, sectioned) = build(&page);
        let report = rewrite_links(&mut dom, &sectioned.sections, &sectioned.links);

        prop_assert!(report.dangling.is_empty());
        let anchors = Matcher::tag("a").with_class("x");
        let mut seen = 0;
        for anchor in find_all(&dom, container, &anchors) {
            let href = dom.get_attr(anchor, "href").unwrap();
            let (file, id) = href.split_once('#').unwrap();
            let k = id.trim_start_matches('s');
            prop_assert_eq!(file, format!("section-{k}.xhtml"));
            seen += 1;
        }
        prop_assert_eq!(report.rewritten, seen);

        // Absolute links are never touched.
        let tos = find_first(&dom, container, &Matcher::tag("a").with_attr_value("href", "/tos"));
        prop_assert!(tos.is_some());
    }

    #[test]
    fn prop_serialize_preserves_structure(page in page()) {
        let (dom, _, _, sectioned) = build(&page);

        for section in &sectioned.sections {
            for &node in &section.nodes {
                let markup = serialize(&dom, node).unwrap();
                let reparsed = parse_html(format!("<body>{markup}</body>").as_bytes()).unwrap();
                let body = find_first(&reparsed, reparsed.document(), &Matcher::tag("body")).unwrap();
                let first = reparsed.children(body).next().unwrap();

                prop_assert_eq!(structure(&reparsed, first), structure(&dom, node));
            }
        }
    }
}
