//! The bridge dispatch layer.
//!
//! [`Bridge`] is the safe Rust face of the library. Each method resolves its
//! handles, calls into the DOM and registers whatever new nodes come out,
//! all inside one critical section, so a handle can never be freed between
//! being resolved and being used.
//!
//! Methods report failures as [`BridgeError`](crate::BridgeError). The
//! boundary layers in `ffi` and `wasm` turn those into sentinels.

mod element;
mod node;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::documents::{DocId, DocumentStore};
use crate::dom::{self, ArenaDom, ArenaNodeId};
use crate::error::{BridgeError, Result};
use crate::registry::{Handle, NodeKind, NodeRef, Registry};

/// Registry and documents, guarded together.
#[derive(Debug, Default)]
struct State {
    registry: Registry,
    documents: DocumentStore,
}

impl State {
    fn issue_node(&mut self, node: NodeRef) -> Handle {
        self.documents.acquire(node.doc);
        self.registry.issue_node(node)
    }

    fn issue_list(&mut self, nodes: Vec<NodeRef>) -> Handle {
        for node in &nodes {
            self.documents.acquire(node.doc);
        }
        self.registry.issue_list(nodes)
    }

    /// Issue a handle for a node of a live document.
    fn issue_at(&mut self, doc: DocId, node: ArenaNodeId) -> Result<Handle> {
        let node = NodeRef::new(doc, self.dom(doc)?, node);
        Ok(self.issue_node(node))
    }

    /// Issue one handle per node, in order.
    fn issue_each(
        &mut self,
        doc: DocId,
        nodes: impl IntoIterator<Item = ArenaNodeId>,
    ) -> Result<Vec<Handle>> {
        nodes
            .into_iter()
            .map(|node| self.issue_at(doc, node))
            .collect()
    }

    /// Issue a list handle over nodes of one document.
    fn list_at(
        &mut self,
        doc: DocId,
        nodes: impl IntoIterator<Item = ArenaNodeId>,
    ) -> Result<Handle> {
        let dom = self.dom(doc)?;
        let refs = nodes
            .into_iter()
            .map(|node| NodeRef::new(doc, dom, node))
            .collect();
        Ok(self.issue_list(refs))
    }

    /// Store a new document and issue a handle for `node` inside it.
    fn adopt(&mut self, dom: ArenaDom, base_uri: &str, node: ArenaNodeId) -> Handle {
        let kind = NodeKind::of(&dom, node);
        let doc = self.documents.insert(dom, base_uri);
        self.issue_node(NodeRef { doc, node, kind })
    }

    fn free(&mut self, handle: Handle) {
        if let Some(entry) = self.registry.free(handle) {
            for doc in entry.documents() {
                self.documents.release(doc);
            }
        }
    }

    /// Reclaim detached nodes of `doc` no handle can reach, once enough
    /// of them have piled up.
    fn reclaim(&mut self, doc: DocId) {
        let Ok(entry) = self.documents.get_mut(doc) else {
            return;
        };
        if !entry.dom.needs_collection() {
            return;
        }
        let pinned: Vec<_> = self.registry.nodes_in(doc).collect();
        let reclaimed = entry.dom.collect_garbage(pinned);
        tracing::trace!(?doc, reclaimed, "reclaimed detached nodes");
    }

    fn clear(&mut self) -> usize {
        self.documents.clear();
        self.registry.clear()
    }

    fn dom(&self, doc: DocId) -> Result<&ArenaDom> {
        Ok(&self.documents.get(doc)?.dom)
    }

    fn dom_mut(&mut self, doc: DocId) -> Result<&mut ArenaDom> {
        Ok(&mut self.documents.get_mut(doc)?.dom)
    }

    /// Resolve an element or document along with its tree.
    fn element(&self, handle: Handle) -> Result<(NodeRef, &ArenaDom)> {
        let node = self.registry.resolve_element(handle)?;
        Ok((node, self.dom(node.doc)?))
    }

    fn element_mut(&mut self, handle: Handle) -> Result<(NodeRef, &mut ArenaDom)> {
        let node = self.registry.resolve_element(handle)?;
        Ok((node, self.dom_mut(node.doc)?))
    }

    /// Resolve an element, document or text node along with its tree.
    fn any(&self, handle: Handle) -> Result<(NodeRef, &ArenaDom)> {
        let node = self.registry.resolve_any(handle)?;
        Ok((node, self.dom(node.doc)?))
    }

    fn any_mut(&mut self, handle: Handle) -> Result<(NodeRef, &mut ArenaDom)> {
        let node = self.registry.resolve_any(handle)?;
        Ok((node, self.dom_mut(node.doc)?))
    }

    fn text(&self, handle: Handle) -> Result<(NodeRef, &ArenaDom)> {
        let node = self.registry.resolve_text(handle)?;
        Ok((node, self.dom(node.doc)?))
    }

    fn text_mut(&mut self, handle: Handle) -> Result<(NodeRef, &mut ArenaDom)> {
        let node = self.registry.resolve_text(handle)?;
        Ok((node, self.dom_mut(node.doc)?))
    }
}

/// A handle registry over parsed HTML documents.
///
/// Independent bridges share nothing, which keeps tests isolated. The
/// boundary layers use one process-wide instance.
#[derive(Debug, Default)]
pub struct Bridge {
    state: Mutex<State>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every operation leaves the tables consistent before it can panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse a complete HTML document.
    ///
    /// Returns a handle to the document node. Malformed markup is
    /// recovered from, never rejected.
    pub fn parse(&self, html: &str, base_uri: &str) -> Handle {
        let dom = dom::parse_document(html);
        let root = dom.document();
        self.lock().adopt(dom, base_uri, root)
    }

    /// Parse body-fragment markup into a fresh document.
    ///
    /// Returns a handle to the document node.
    pub fn parse_fragment(&self, html: &str, base_uri: &str) -> Handle {
        let dom = dom::parse_body_fragment(html);
        let root = dom.document();
        self.lock().adopt(dom, base_uri, root)
    }

    /// Create a detached element in a document of its own.
    pub fn create_element(&self, tag: &str) -> Result<Handle> {
        if tag.is_empty() || tag.chars().any(|c| c.is_whitespace() || "<>/".contains(c)) {
            return Err(BridgeError::InvalidTagName(tag.to_string()));
        }
        let (dom, node) = dom::detached_element(tag);
        Ok(self.lock().adopt(dom, "", node))
    }

    /// Create a detached text node in a document of its own.
    pub fn create_text_node(&self, text: &str) -> Handle {
        let (dom, node) = dom::detached_text(text);
        self.lock().adopt(dom, "", node)
    }

    /// Build a node list from existing handles.
    ///
    /// Handles that do not resolve to a live element, document or text node
    /// are skipped.
    pub fn create_elements(&self, handles: &[Handle]) -> Handle {
        let mut state = self.lock();
        let nodes = handles
            .iter()
            .filter_map(|&h| state.registry.resolve_any(h).ok())
            .collect();
        state.issue_list(nodes)
    }

    /// Release a handle. Unknown handles are ignored.
    pub fn free(&self, handle: Handle) {
        self.lock().free(handle);
    }

    /// Invalidate every handle and drop every document.
    ///
    /// The next handle issued is `1` again. Callers must make sure no other
    /// thread still uses handles from before the reset.
    pub fn release_all(&self) {
        let dropped = self.lock().clear();
        tracing::info!(handles = dropped, "released all handles");
    }

    /// Tear down the bridge. Same as [`Bridge::release_all`].
    pub fn dispose(&self) {
        let dropped = self.lock().clear();
        tracing::info!(handles = dropped, "disposed bridge");
    }

    /// Number of live handles.
    pub fn live_handles(&self) -> usize {
        self.lock().registry.len()
    }

    /// Number of documents kept alive by live handles.
    pub fn live_documents(&self) -> usize {
        self.lock().documents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_returns_document() {
        let bridge = Bridge::new();
        let doc = bridge.parse("<p>hi</p>", "");
        assert_eq!(doc, 1);
        assert_eq!(bridge.node_name(doc).unwrap(), "#document");
        assert_eq!(bridge.live_documents(), 1);
    }

    #[test]
    fn test_documents_follow_leases() {
        let bridge = Bridge::new();
        let doc = bridge.parse("<p>hi</p>", "");
        let p = bridge.select_first(doc, "p").unwrap();

        bridge.free(doc);
        assert_eq!(bridge.live_documents(), 1);
        assert_eq!(bridge.text(p).unwrap(), "hi");

        bridge.free(p);
        assert_eq!(bridge.live_documents(), 0);
    }

    #[test]
    fn test_list_holds_document() {
        let bridge = Bridge::new();
        let doc = bridge.parse("<i>a</i><i>b</i>", "");
        let list = bridge.select(doc, "i").unwrap();
        bridge.free(doc);
        assert_eq!(bridge.live_documents(), 1);

        let second = bridge.get(list, 1).unwrap();
        bridge.free(list);
        assert_eq!(bridge.text(second).unwrap(), "b");
        bridge.free(second);
        assert_eq!(bridge.live_documents(), 0);
    }

    #[test]
    fn test_create_element_rejects_bad_tags() {
        let bridge = Bridge::new();
        assert!(bridge.create_element("").is_err());
        assert!(bridge.create_element("a b").is_err());
        assert!(bridge.create_element("<p>").is_err());
        assert_eq!(bridge.live_handles(), 0);
    }

    #[test]
    fn test_create_elements_filters() {
        let bridge = Bridge::new();
        let a = bridge.create_element("a").unwrap();
        let t = bridge.create_text_node("x");
        let list = bridge.create_elements(&[a, t, 999, a]);
        assert_eq!(bridge.size(list).unwrap(), 3);

        let second = bridge.get(list, 1).unwrap();
        assert!(bridge.is_text_node(second));

        bridge.free(t);
        let list = bridge.create_elements(&[t, a]);
        assert_eq!(bridge.size(list).unwrap(), 1);
    }

    #[test]
    fn test_release_all_resets() {
        let bridge = Bridge::new();
        let doc = bridge.parse("<p>hi</p>", "");
        bridge.select(doc, "p").unwrap();
        bridge.release_all();
        assert_eq!(bridge.live_handles(), 0);
        assert_eq!(bridge.live_documents(), 0);
        assert!(bridge.text(doc).is_err());
        assert_eq!(bridge.parse("", ""), 1);
    }
}
