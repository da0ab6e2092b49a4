//! The Node Model: an arena DOM built by html5ever.
//!
//! Parsing never fails: html5ever recovers from malformed markup the way
//! browsers do, so every entry point here returns a tree.

mod arena;
pub mod serialize;
pub mod text;
mod tree_sink;

pub use arena::{
    ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute, ChildrenIter, Descendants,
    attr_name, html_name,
};

use html5ever::driver::ParseOpts;
use html5ever::parse_document as html5ever_parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;

use tree_sink::ArenaSink;

/// Parse a complete HTML document.
///
/// Missing `html`, `head` and `body` elements are synthesized.
pub fn parse_document(html: &str) -> ArenaDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    html5ever_parse_document(ArenaSink::new(), opts)
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse body-fragment markup into the body of a fresh document.
pub fn parse_body_fragment(html: &str) -> ArenaDom {
    let wrapped = format!("<html><head></head><body>{html}</body></html>");
    parse_document(&wrapped)
}

/// Parse markup meant to be inserted under an existing element.
///
/// Returns the scratch DOM and the top-level nodes of the fragment, in
/// order. The nodes are still attached to the scratch body; callers copy
/// them out with [`ArenaDom::import`].
pub fn parse_nodes(html: &str) -> (ArenaDom, Vec<ArenaNodeId>) {
    let dom = parse_body_fragment(html);
    let nodes = match dom.find_by_tag("body") {
        Some(body) => dom.children(body).collect(),
        None => Vec::new(),
    };
    (dom, nodes)
}

/// Create a document holding a single detached element.
///
/// The element is not attached to the document root, so it has no parent.
pub fn detached_element(tag: &str) -> (ArenaDom, ArenaNodeId) {
    let mut dom = ArenaDom::new();
    let id = dom.create_element(html_name(tag), Vec::new());
    (dom, id)
}

/// Create a document holding a single detached text node.
pub fn detached_text(text: &str) -> (ArenaDom, ArenaNodeId) {
    let mut dom = ArenaDom::new();
    let id = dom.create_text(text.to_string());
    (dom, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_synthesizes_structure() {
        let dom = parse_document("<p>hi</p>");
        assert!(dom.find_by_tag("html").is_some());
        assert!(dom.find_by_tag("head").is_some());
        assert!(dom.find_by_tag("body").is_some());
    }

    #[test]
    fn test_parse_nodes_returns_top_level_only() {
        let (dom, nodes) = parse_nodes("<span>a</span>text<b>c</b>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(dom.element_name(nodes[0]).unwrap().as_ref(), "span");
        assert_eq!(dom.text_content(nodes[1]), Some("text"));
        assert_eq!(dom.element_name(nodes[2]).unwrap().as_ref(), "b");
    }

    #[test]
    fn test_parse_nodes_empty() {
        let (_, nodes) = parse_nodes("");
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_detached_element_has_no_parent() {
        let (dom, id) = detached_element("div");
        assert_eq!(dom.parent(id), None);
        assert_eq!(dom.element_name(id).unwrap().as_ref(), "div");
        assert_eq!(dom.children(dom.document()).count(), 0);
    }
}
