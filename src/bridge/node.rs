//! Node lists, tree navigation, and operations valid on any node.

use crate::dom::{ArenaNodeData, serialize, text};
use crate::error::{BridgeError, Result};
use crate::registry::{Handle, NodeKind, NodeRef};
use crate::url_resolver;

use super::Bridge;

impl Bridge {
    /// Number of nodes in a list.
    pub fn size(&self, list: Handle) -> Result<usize> {
        Ok(self.lock().registry.resolve_node_list(list)?.len())
    }

    /// A fresh handle for the node at `index` of a list.
    pub fn get(&self, list: Handle, index: i64) -> Result<Handle> {
        let mut state = self.lock();
        let nodes = state.registry.resolve_node_list(list)?;
        let node = usize::try_from(index)
            .ok()
            .and_then(|i| nodes.get(i))
            .copied()
            .ok_or(BridgeError::IndexOutOfRange {
                index,
                len: nodes.len(),
            })?;
        Ok(state.issue_node(node))
    }

    pub fn first(&self, list: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let node = *state
            .registry
            .resolve_node_list(list)?
            .first()
            .ok_or(BridgeError::NotFound)?;
        Ok(state.issue_node(node))
    }

    pub fn last(&self, list: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let node = *state
            .registry
            .resolve_node_list(list)?
            .last()
            .ok_or(BridgeError::NotFound)?;
        Ok(state.issue_node(node))
    }

    /// The parent element or document.
    pub fn parent(&self, handle: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let parent = dom
            .parent(node.node)
            .filter(|&p| NodeKind::of(dom, p).is_element_like())
            .ok_or(BridgeError::NotFound)?;
        state.issue_at(node.doc, parent)
    }

    /// The parent node of any kind.
    pub fn parent_node(&self, handle: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let parent = dom.parent(node.node).ok_or(BridgeError::NotFound)?;
        state.issue_at(node.doc, parent)
    }

    /// The nearest following element sibling.
    pub fn next_sibling(&self, handle: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let next = dom
            .next_element_sibling(node.node)
            .ok_or(BridgeError::NotFound)?;
        state.issue_at(node.doc, next)
    }

    /// The nearest preceding element sibling.
    pub fn prev_sibling(&self, handle: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let prev = dom
            .prev_element_sibling(node.node)
            .ok_or(BridgeError::NotFound)?;
        state.issue_at(node.doc, prev)
    }

    /// Element siblings, excluding the node itself, as a list handle.
    pub fn siblings(&self, handle: Handle) -> Result<Handle> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let parent = dom.parent(node.node).ok_or(BridgeError::NotFound)?;
        let siblings: Vec<_> = dom
            .element_children(parent)
            .filter(|&s| s != node.node)
            .collect();
        state.list_at(node.doc, siblings)
    }

    /// `#document`, `#text`, or the element's tag name.
    pub fn node_name(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (node, dom) = state.any(handle)?;
        Ok(match dom.get(node.node).map(|n| &n.data) {
            Some(ArenaNodeData::Element { name, .. }) => name.local.to_string(),
            Some(ArenaNodeData::Text(_)) => "#text".to_string(),
            Some(ArenaNodeData::Document) => "#document".to_string(),
            _ => return Err(BridgeError::DetachedNode),
        })
    }

    /// Number of child nodes of every kind.
    pub fn child_node_size(&self, handle: Handle) -> Result<usize> {
        let state = self.lock();
        let (node, dom) = state.any(handle)?;
        Ok(dom.children(node.node).count())
    }

    /// A fresh handle for the child node at `index`.
    pub fn child_node(&self, handle: Handle, index: i64) -> Result<Handle> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let len = dom.children(node.node).count();
        let child = usize::try_from(index)
            .ok()
            .and_then(|i| dom.children(node.node).nth(i))
            .ok_or(BridgeError::IndexOutOfRange { index, len })?;
        state.issue_at(node.doc, child)
    }

    /// Fresh handles for every child node, in order.
    pub fn child_node_handles(&self, handle: Handle) -> Result<Vec<Handle>> {
        let mut state = self.lock();
        let (node, dom) = state.any(handle)?;
        let children: Vec<_> = dom.children(node.node).collect();
        state.issue_each(node.doc, children)
    }

    /// Whether `handle` currently names a text node.
    ///
    /// Unknown handles are not text nodes.
    pub fn is_text_node(&self, handle: Handle) -> bool {
        self.lock().registry.resolve_text(handle).is_ok()
    }

    /// Serialize any node. Text nodes come out escaped.
    pub fn node_outer_html(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (node, dom) = state.any(handle)?;
        Ok(serialize::outer_html(dom, node.node))
    }

    /// Detach any node from its parent.
    pub fn remove_node(&self, handle: Handle) -> Result<()> {
        let mut state = self.lock();
        let (node, dom) = state.any_mut(handle)?;
        dom.detach(node.node);
        Ok(())
    }

    /// Base URI of the document the node lives in.
    pub fn node_base_uri(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let node = state.registry.resolve_any(handle)?;
        Ok(state.documents.get(node.doc)?.base_uri.clone())
    }

    /// Replace the base URI of the node's document.
    ///
    /// Every handle into that document sees the new value.
    pub fn set_node_base_uri(&self, handle: Handle, base_uri: &str) -> Result<()> {
        let mut state = self.lock();
        let node = state.registry.resolve_any(handle)?;
        state.documents.get_mut(node.doc)?.base_uri = base_uri.to_string();
        Ok(())
    }

    /// An attribute resolved to an absolute URL, `""` when it cannot be.
    pub fn node_abs_url(&self, handle: Handle, key: &str) -> Result<String> {
        let state = self.lock();
        let node = state.registry.resolve_any(handle)?;
        let doc = state.documents.get(node.doc)?;
        let value = if node.kind.is_element_like() {
            doc.dom.get_attr(node.node, key).unwrap_or_default()
        } else {
            ""
        };
        Ok(url_resolver::abs_url(&doc.base_uri, value))
    }

    /// Whitespace-normalized content of a text node.
    pub fn text_node_text(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (node, dom) = state.text(handle)?;
        Ok(text::normalize_whitespace(
            dom.text_content(node.node).unwrap_or_default(),
        ))
    }

    pub fn set_text_node_text(&self, handle: Handle, content: &str) -> Result<()> {
        let mut state = self.lock();
        let (node, dom) = state.text_mut(handle)?;
        dom.set_text_content(node.node, content);
        Ok(())
    }

    /// Raw content of a text node.
    pub fn text_node_whole_text(&self, handle: Handle) -> Result<String> {
        let state = self.lock();
        let (node, dom) = state.text(handle)?;
        Ok(text::whole_text(dom, node.node))
    }

    /// Whether a text node holds only whitespace.
    pub fn text_node_is_blank(&self, handle: Handle) -> Result<bool> {
        let state = self.lock();
        let (node, dom) = state.text(handle)?;
        Ok(text::is_blank(dom.text_content(node.node).unwrap_or_default()))
    }

    /// The node a live handle names, for embedding code.
    pub fn resolve(&self, handle: Handle) -> Result<NodeRef> {
        self.lock().registry.resolve_any(handle)
    }
}
