//! Bridge API tests.
//!
//! Exercises the handle contract through the safe Rust surface: handle
//! lifetime, aliasing, sentinels and the query/accessor round trips a host
//! relies on.

use dombridge::{Bridge, BridgeError, Handle};

fn parse(bridge: &Bridge, html: &str) -> Handle {
    bridge.parse(html, "")
}

// ============================================================================
// Handle Lifetime Tests
// ============================================================================

#[test]
fn test_freed_handle_fails_everywhere() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p id=a class=b>hi</p>");
    let p = bridge.select_first(doc, "p").unwrap();
    let list = bridge.select(doc, "p").unwrap();

    bridge.free(p);
    bridge.free(list);

    assert_eq!(bridge.text(p), Err(BridgeError::UnknownHandle(p)));
    assert_eq!(bridge.attr(p, "id"), Err(BridgeError::UnknownHandle(p)));
    assert!(bridge.parent(p).is_err());
    assert!(bridge.child_node_size(p).is_err());
    assert!(!bridge.is_text_node(p));
    assert!(bridge.size(list).is_err());
    assert!(bridge.get(list, 0).is_err());
}

#[test]
fn test_freed_text_node_is_not_blank() {
    let bridge = Bridge::new();
    let blank = bridge.create_text_node("   ");
    assert_eq!(bridge.text_node_is_blank(blank), Ok(true));

    bridge.free(blank);
    assert_eq!(
        bridge.text_node_is_blank(blank),
        Err(BridgeError::UnknownHandle(blank))
    );
}

#[test]
fn test_free_is_idempotent_and_isolated() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    let a = bridge.select_first(doc, "p").unwrap();
    let b = bridge.select_first(doc, "p").unwrap();

    bridge.free(a);
    bridge.free(a);
    bridge.free(-1);
    bridge.free(0);
    bridge.free(123_456);

    assert_eq!(bridge.text(b).unwrap(), "hi");
}

#[test]
fn test_release_all_invalidates_and_restarts() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    let handles: Vec<_> = (0..5)
        .map(|_| bridge.select_first(doc, "p").unwrap())
        .collect();

    bridge.release_all();

    assert!(bridge.text(doc).is_err());
    for h in handles {
        assert!(bridge.text(h).is_err());
    }
    assert_eq!(bridge.live_handles(), 0);
    assert_eq!(parse(&bridge, "<b>again</b>"), 1);
}

#[test]
fn test_dispose_behaves_like_release_all() {
    let bridge = Bridge::new();
    parse(&bridge, "<p>hi</p>");
    bridge.dispose();
    assert_eq!(bridge.live_documents(), 0);
    assert_eq!(bridge.create_text_node("t"), 1);
}

#[test]
fn test_handles_are_monotonic() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<i>1</i><i>2</i><i>3</i>");
    let mut last = doc;
    for _ in 0..10 {
        let h = bridge.select_first(doc, "i").unwrap();
        assert!(h > last);
        bridge.free(h);
        last = h;
    }
}

#[test]
fn test_independent_bridges() {
    let one = Bridge::new();
    let two = Bridge::new();
    let doc = parse(&one, "<p>one</p>");
    assert!(two.text(doc).is_err());
    assert_eq!(parse(&two, "<p>two</p>"), doc);
}

// ============================================================================
// Query and Accessor Tests
// ============================================================================

#[test]
fn test_parse_select_get_text() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    assert_ne!(doc, -1);

    let list = bridge.select(doc, "p").unwrap();
    assert_eq!(bridge.size(list).unwrap(), 1);
    let p = bridge.get(list, 0).unwrap();
    assert_eq!(bridge.text(p).unwrap(), "hi");
}

#[test]
fn test_empty_select_vs_select_first() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");

    let list = bridge.select(doc, "table").unwrap();
    assert!(list > 0);
    assert_eq!(bridge.size(list).unwrap(), 0);
    assert_eq!(bridge.select_first(doc, "table"), Err(BridgeError::NotFound));
}

#[test]
fn test_attr_absent_is_not_empty() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    let p = bridge.select_first(doc, "p").unwrap();

    assert_eq!(bridge.attr(p, "missing-attr").unwrap(), None);
    bridge.set_attr(p, "k", "").unwrap();
    assert_eq!(bridge.attr(p, "k").unwrap(), Some(String::new()));
    assert!(bridge.has_attr(p, "k").unwrap());
}

#[test]
fn test_parent_aliases_same_node() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, r#"<section data-x="1"><p>hi</p></section>"#);
    let p = bridge.select_first(doc, "p").unwrap();

    let a = bridge.parent(p).unwrap();
    let b = bridge.parent(p).unwrap();
    assert_ne!(a, b);
    assert_eq!(bridge.tag_name(a), bridge.tag_name(b));
    assert_eq!(bridge.attr(a, "data-x"), bridge.attr(b, "data-x"));

    bridge.set_attr(a, "data-x", "2").unwrap();
    assert_eq!(bridge.attr(b, "data-x").unwrap(), Some("2".to_string()));
}

#[test]
fn test_create_element_set_html_round_trip() {
    let bridge = Bridge::new();
    let div = bridge.create_element("div").unwrap();
    bridge.set_html(div, "<span>x</span>").unwrap();
    assert!(bridge.inner_html(div).unwrap().contains("<span>x</span>"));
    assert!(bridge.parent(div).is_err());
}

#[test]
fn test_is_text_node() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi<b>there</b></p>");
    let p = bridge.select_first(doc, "p").unwrap();
    let created = bridge.create_text_node("x");
    let navigated = bridge.child_node(p, 0).unwrap();
    let element = bridge.child_node(p, 1).unwrap();
    let list = bridge.children(p).unwrap();

    assert!(bridge.is_text_node(created));
    assert!(bridge.is_text_node(navigated));
    assert!(!bridge.is_text_node(element));
    assert!(!bridge.is_text_node(p));
    assert!(!bridge.is_text_node(doc));
    assert!(!bridge.is_text_node(list));
}

#[test]
fn test_list_handles_are_not_nodes() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    let list = bridge.select(doc, "p").unwrap();
    assert!(matches!(
        bridge.text(list),
        Err(BridgeError::KindMismatch { .. })
    ));
    assert!(matches!(
        bridge.size(doc),
        Err(BridgeError::KindMismatch { .. })
    ));
}

#[test]
fn test_selector_errors() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    for bad in ["", "p[", "::nope(", ">>", "p:eq(0)"] {
        assert!(
            matches!(bridge.select(doc, bad), Err(BridgeError::Selector(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_contains_selectors() {
    let bridge = Bridge::new();
    let doc = parse(
        &bridge,
        "<ul><li>Red apple</li><li>green <b>APPLE</b></li><li>pear</li></ul>",
    );
    let all = bridge.select(doc, "li:contains(apple)").unwrap();
    assert_eq!(bridge.size(all).unwrap(), 2);

    let own = bridge.select(doc, "li:containsOwn(apple)").unwrap();
    assert_eq!(bridge.size(own).unwrap(), 1);

    let exact = bridge.select(doc, "li:containsWholeText(APPLE)").unwrap();
    assert_eq!(bridge.size(exact).unwrap(), 1);
}

#[test]
fn test_fragment_and_document_shapes() {
    let bridge = Bridge::new();
    let doc = bridge.parse("<title>T</title><p>a</p>", "");
    let frag = bridge.parse_fragment("<p>a</p>", "");

    assert_eq!(bridge.node_name(doc).unwrap(), "#document");
    assert_eq!(bridge.tag_name(frag).unwrap(), "#root");
    assert!(bridge.select_first(frag, "body > p").is_ok());

    let title = bridge.select_first(doc, "title").unwrap();
    assert_eq!(bridge.data(title).unwrap(), "T");
}

#[test]
fn test_malformed_markup_still_parses() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<div><p>unclosed<span>deep</div></b>");
    let span = bridge.select_first(doc, "span").unwrap();
    assert_eq!(bridge.text(span).unwrap(), "deep");
}

#[test]
fn test_create_elements_keeps_text_nodes() {
    let bridge = Bridge::new();
    let doc = parse(&bridge, "<p>hi</p>");
    let p = bridge.select_first(doc, "p").unwrap();
    let created = bridge.create_text_node("x");
    let navigated = bridge.child_node(p, 0).unwrap();
    let gone = bridge.create_text_node("y");
    bridge.free(gone);

    let list = bridge.create_elements(&[created, p, navigated, gone, -1]);
    assert_eq!(bridge.size(list).unwrap(), 3);

    let first = bridge.first(list).unwrap();
    assert!(bridge.is_text_node(first));
    assert_eq!(bridge.text_node_whole_text(first).unwrap(), "x");
    let last = bridge.last(list).unwrap();
    assert_eq!(bridge.text_node_whole_text(last).unwrap(), "hi");
}

// ============================================================================
// Deep Document Tests
// ============================================================================

#[test]
fn test_deeply_nested_document() {
    let depth = 50_000;
    let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let bridge = Bridge::new();
    let doc = parse(&bridge, &html);

    assert_eq!(bridge.text(doc).unwrap(), "x");
    assert!(bridge.outer_html(doc).unwrap().contains("<div>x</div>"));

    let body = bridge.select_first(doc, "body").unwrap();
    bridge.set_html(body, &html).unwrap();
    assert_eq!(bridge.text(body).unwrap(), "x");
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_shared_across_threads() {
    let bridge = std::sync::Arc::new(Bridge::new());
    let doc = parse(&bridge, "<ul><li>a</li><li>b</li><li>c</li></ul>");

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let bridge = bridge.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let list = bridge.select(doc, "li").unwrap();
                    let last = bridge.last(list).unwrap();
                    assert_eq!(bridge.text(last).unwrap(), "c");
                    bridge.free(last);
                    bridge.free(list);
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(bridge.live_handles(), 1);
}
