//! Text extraction from arena nodes.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Elements whose boundaries separate words in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td",
    "tfoot", "th", "thead", "title", "tr", "ul",
];

/// Elements whose text content is data rather than markup.
const DATA_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check whether a string is empty or whitespace-only.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Combined, whitespace-normalized text of a node and all its descendants.
///
/// Block element and `<br>` boundaries count as whitespace, so
/// `<p>a</p><p>b</p>` yields `"a b"`.
pub fn text(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut raw = String::new();
    let mut stack = vec![Visit::Enter(id)];

    while let Some(visit) = stack.pop() {
        let id = match visit {
            Visit::Leave => {
                raw.push(' ');
                continue;
            }
            Visit::Enter(id) => id,
        };
        let Some(node) = dom.get(id) else {
            continue;
        };
        match &node.data {
            ArenaNodeData::Text(t) => raw.push_str(t),
            ArenaNodeData::Element { name, .. } => {
                let tag = name.local.as_ref();
                if tag == "br" || BLOCK_ELEMENTS.contains(&tag) {
                    raw.push(' ');
                    stack.push(Visit::Leave);
                }
                push_children(dom, id, &mut stack);
            }
            ArenaNodeData::Document => push_children(dom, id, &mut stack),
            ArenaNodeData::Comment(_) | ArenaNodeData::Doctype { .. } => {}
        }
    }
    normalize_whitespace(&raw)
}

/// Pending step of the text walk.
enum Visit {
    Enter(ArenaNodeId),
    /// Closing boundary of a block element.
    Leave,
}

fn push_children(dom: &ArenaDom, id: ArenaNodeId, stack: &mut Vec<Visit>) {
    let start = stack.len();
    stack.extend(dom.children(id).map(Visit::Enter));
    stack[start..].reverse();
}

/// Whitespace-normalized text of the direct text children only.
pub fn own_text(dom: &ArenaDom, id: ArenaNodeId) -> String {
    normalize_whitespace(&whole_own_text(dom, id))
}

/// Raw, unnormalized text of a node and all its descendants.
pub fn whole_text(dom: &ArenaDom, id: ArenaNodeId) -> String {
    if let Some(t) = dom.text_content(id) {
        return t.to_string();
    }
    std::iter::once(id)
        .chain(dom.descendants(id))
        .filter_map(|n| dom.text_content(n))
        .collect()
}

/// Raw, unnormalized text of the direct text children only.
pub fn whole_own_text(dom: &ArenaDom, id: ArenaNodeId) -> String {
    dom.children(id)
        .filter_map(|c| dom.text_content(c))
        .collect()
}

/// Data content of script, style, textarea and title elements.
///
/// Any other node has empty data.
pub fn data(dom: &ArenaDom, id: ArenaNodeId) -> String {
    match dom.element_name(id) {
        Some(name) if DATA_ELEMENTS.contains(&name.as_ref()) => whole_text(dom, id),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_body_fragment, parse_document};

    #[test]
    fn test_text_normalizes() {
        let dom = parse_body_fragment("<div>  Hello\n   <b>big</b>\tworld  </div>");
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(text(&dom, div), "Hello big world");
    }

    #[test]
    fn test_text_separates_blocks() {
        let dom = parse_body_fragment("<div><p>a</p><p>b</p>c<br>d</div>");
        let div = dom.find_by_tag("div").unwrap();
        assert_eq!(text(&dom, div), "a b c d");
    }

    #[test]
    fn test_inline_elements_do_not_separate() {
        let dom = parse_body_fragment("<p>un<b>believ</b>able</p>");
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(text(&dom, p), "unbelievable");
    }

    #[test]
    fn test_own_text() {
        let dom = parse_body_fragment("<p>one <b>two</b> three</p>");
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(own_text(&dom, p), "one three");
        assert_eq!(whole_own_text(&dom, p), "one  three");
    }

    #[test]
    fn test_whole_text_is_raw() {
        let dom = parse_body_fragment("<p> a \n<i>b</i></p>");
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(whole_text(&dom, p), " a \nb");
    }

    #[test]
    fn test_data() {
        let dom = parse_document("<script>var x = 1 < 2;</script><p>text</p>");
        let script = dom.find_by_tag("script").unwrap();
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(data(&dom, script), "var x = 1 < 2;");
        assert_eq!(data(&dom, p), "");
    }

    #[test]
    fn test_text_of_deep_tree() {
        let mut dom = crate::dom::ArenaDom::new();
        let mut parent = dom.document();
        for _ in 0..50_000 {
            let div = dom.create_element(crate::dom::html_name("div"), vec![]);
            dom.append(parent, div);
            parent = div;
        }
        dom.append_text(parent, "deep");

        assert_eq!(text(&dom, dom.document()), "deep");
        assert_eq!(whole_text(&dom, dom.document()), "deep");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t"));
        assert!(!is_blank(" x "));
    }
}
