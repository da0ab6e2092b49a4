//! Queries, attributes, text and markup of element-like nodes.

use crate::dom::{self, ArenaDom, ArenaNodeId, serialize, text};
use crate::error::{BridgeError, Result};
use crate::registry::{Handle, NodeKind};
use crate::select::{self, Query};

use super::Bridge;

/// Where parsed markup goes relative to existing children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Insert {
    Start,
    End,
}

/// Parse `html` as a fragment and copy its nodes under `parent`.
fn insert_markup(dom: &mut ArenaDom, parent: ArenaNodeId, html: &str, at: Insert) {
    let (scratch, nodes) = dom::parse_nodes(html);
    let copies: Vec<_> = nodes.iter().map(|&n| dom.import(&scratch, n)).collect();
    match at {
        Insert::Start => {
            for copy in copies.into_iter().rev() {
                dom.prepend(parent, copy);
            }
        }
        Insert::End => {
            for copy in copies {
                dom.append(parent, copy);
            }
        }
    }
}

fn compile(selector: &str) -> Result<Query> {
    Query::parse(selector).inspect_err(|err| tracing::debug!(%err, "rejected selector"))
}

impl Bridge {
    /// All matching elements under `handle`, as a list handle.
    ///
    /// The context element itself is included when it matches. No matches
    /// still yields a valid, empty list.
    pub fn select(&self, handle: Handle, selector: &str) -> Result<Handle> {
        let query = compile(selector)?;
        let mut state = self.lock();
        let (ctx, dom) = state.element(handle)?;
        let found = select::select(dom, ctx.node, &query);
        state.list_at(ctx.doc, found)
    }

    /// The first element `select` would return.
    pub fn select_first(&self, handle: Handle, selector: &str) -> Result<Handle> {
        let query = compile(selector)?;
        let mut state = self.lock();
        let (ctx, dom) = state.element(handle)?;
        let found = select::select_first(dom, ctx.node, &query).ok_or(BridgeError::NotFound)?;
        state.issue_at(ctx.doc, found)
    }

    /// Attribute value, `None` when the attribute is missing.
    pub fn attr(&self, handle: Handle, key: &str) -> Result<Option<String>> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(dom.get_attr(el.node, key).map(str::to_string))
    }

    pub fn has_attr(&self, handle: Handle, key: &str) -> Result<bool> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(dom.get_attr(el.node, key).is_some())
    }

    /// Set an attribute. Documents have no attributes and ignore this.
    pub fn set_attr(&self, handle: Handle, key: &str, value: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        if !key.is_empty() {
            dom.set_attr(el.node, key, value);
        }
        Ok(())
    }

    pub fn remove_attr(&self, handle: Handle, key: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        dom.remove_attr(el.node, key);
        Ok(())
    }

    /// Combined text of all descendants, whitespace-normalized.
    pub fn text(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(text::text(dom, el.node))
    }

    /// Text of direct text children only, whitespace-normalized.
    pub fn own_text(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(text::own_text(dom, el.node))
    }

    pub fn inner_html(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(serialize::inner_html(dom, el.node))
    }

    pub fn outer_html(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(serialize::outer_html(dom, el.node))
    }

    /// Replace all children with a single text node.
    pub fn set_text(&self, handle: Handle, content: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        dom.remove_children(el.node);
        let node = dom.create_text(content.to_string());
        dom.append(el.node, node);
        state.reclaim(el.doc);
        Ok(())
    }

    /// Replace all children with parsed markup.
    pub fn set_html(&self, handle: Handle, html: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        dom.remove_children(el.node);
        insert_markup(dom, el.node, html, Insert::End);
        state.reclaim(el.doc);
        Ok(())
    }

    /// Raw content of script, style, textarea and title elements.
    pub fn data(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(text::data(dom, el.node))
    }

    /// Local tag name, or `#root` for a document.
    pub fn tag_name(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(match dom.element_name(el.node) {
            Some(name) => name.to_string(),
            None => "#root".to_string(),
        })
    }

    /// The `id` attribute, `None` when missing or empty.
    pub fn element_id(&self, handle: Handle) -> Result<Option<String>> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(dom
            .element_id(el.node)
            .filter(|id| !id.is_empty())
            .map(str::to_string))
    }

    /// The raw `class` attribute, `""` when missing.
    pub fn class_name(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(dom.get_attr(el.node, "class").unwrap_or_default().to_string())
    }

    pub fn has_class(&self, handle: Handle, class: &str) -> Result<bool> {
        let state = self.lock();
        let (el, dom) = state.element(handle)?;
        Ok(dom.element_classes(el.node).iter().any(|c| c == class))
    }

    /// Add a class unless already present.
    pub fn add_class(&self, handle: Handle, class: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        if class.is_empty() || el.kind != NodeKind::Element {
            return Ok(());
        }
        let mut classes = dom.element_classes(el.node).to_vec();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            dom.set_attr(el.node, "class", &classes.join(" "));
        }
        Ok(())
    }

    /// Remove a class. Removing the last class drops the attribute.
    pub fn remove_class(&self, handle: Handle, class: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        let classes = dom.element_classes(el.node);
        if !classes.iter().any(|c| c == class) {
            return Ok(());
        }
        let remaining: Vec<_> = classes.iter().filter(|c| *c != class).cloned().collect();
        if remaining.is_empty() {
            dom.remove_attr(el.node, "class");
        } else {
            dom.set_attr(el.node, "class", &remaining.join(" "));
        }
        Ok(())
    }

    /// Element children, as a list handle.
    pub fn children(&self, handle: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let (el, dom) = state.element(handle)?;
        let children: Vec<_> = dom.element_children(el.node).collect();
        state.list_at(el.doc, children)
    }

    /// Detach an element from its parent.
    ///
    /// The handle stays valid; the element just has no parent afterwards.
    pub fn remove(&self, handle: Handle) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        if el.kind != NodeKind::Element {
            return Err(BridgeError::KindMismatch {
                handle,
                expected: "element",
            });
        }
        dom.detach(el.node);
        Ok(())
    }

    /// Insert parsed markup before the existing children.
    pub fn prepend(&self, handle: Handle, html: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        insert_markup(dom, el.node, html, Insert::Start);
        state.reclaim(el.doc);
        Ok(())
    }

    /// Insert parsed markup after the existing children.
    pub fn append(&self, handle: Handle, html: &str) -> Result<()> {
        let mut state = self.lock();
        let (el, dom) = state.element_mut(handle)?;
        insert_markup(dom, el.node, html, Insert::End);
        state.reclaim(el.doc);
        Ok(())
    }

    /// Handles for the direct text children, in order.
    pub fn text_node_handles(&self, handle: Handle) -> Result<Vec<Handle>> {
        let mut state = self.lock();
        let (el, dom) = state.element(handle)?;
        let texts: Vec<_> = dom.children(el.node).filter(|&c| dom.is_text(c)).collect();
        state.issue_each(el.doc, texts)
    }
}
