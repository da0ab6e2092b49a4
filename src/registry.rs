//! The handle registry.
//!
//! Hosts never see DOM nodes, only integer [`Handle`]s. Every handle names
//! exactly one [`Entry`]: either a single node or an immutable snapshot of a
//! node list. Both kinds share one counter, so a handle's kind is decided by
//! a single table lookup.
//!
//! Handles are leases, not identities. Resolving the same tree position
//! twice issues two handles, and freeing one leaves the other intact.

use std::collections::HashMap;

use crate::documents::DocId;
use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId};
use crate::error::{BridgeError, Result};

/// Opaque identity handed to the host. Live handles are always positive.
pub type Handle = i64;

/// Returned across the boundary when an operation yields no handle.
pub const INVALID_HANDLE: Handle = -1;

const FIRST_HANDLE: Handle = 1;

/// What a node reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    /// Comments and doctypes. Registered so child indices line up, but
    /// never resolvable as a node.
    Other,
}

impl NodeKind {
    pub fn of(dom: &ArenaDom, id: ArenaNodeId) -> Self {
        match dom.get(id).map(|n| &n.data) {
            Some(ArenaNodeData::Document) => Self::Document,
            Some(ArenaNodeData::Element { .. }) => Self::Element,
            Some(ArenaNodeData::Text(_)) => Self::Text,
            _ => Self::Other,
        }
    }

    /// Elements and documents: anything that can hold children and be
    /// queried.
    pub fn is_element_like(self) -> bool {
        matches!(self, Self::Document | Self::Element)
    }
}

/// A node in a particular document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub doc: DocId,
    pub node: ArenaNodeId,
    pub kind: NodeKind,
}

impl NodeRef {
    pub fn new(doc: DocId, dom: &ArenaDom, node: ArenaNodeId) -> Self {
        Self {
            doc,
            node,
            kind: NodeKind::of(dom, node),
        }
    }
}

/// What a handle resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Node(NodeRef),
    NodeList(Vec<NodeRef>),
}

impl Entry {
    /// Documents referenced by this entry, once per node reference.
    pub fn documents(&self) -> Vec<DocId> {
        match self {
            Entry::Node(r) => vec![r.doc],
            Entry::NodeList(refs) => refs.iter().map(|r| r.doc).collect(),
        }
    }
}

/// Handle table with a monotonic counter.
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<Handle, Entry>,
    next: Handle,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: FIRST_HANDLE,
        }
    }

    /// Register an entry under a fresh handle.
    ///
    /// Handles are never reused until [`Registry::clear`]. Exhausting the
    /// `i64` range is unsupported.
    pub fn issue(&mut self, entry: Entry) -> Handle {
        let handle = self.next;
        self.next += 1;
        tracing::trace!(handle, list = matches!(entry, Entry::NodeList(_)), "issued handle");
        self.entries.insert(handle, entry);
        handle
    }

    pub fn issue_node(&mut self, node: NodeRef) -> Handle {
        self.issue(Entry::Node(node))
    }

    pub fn issue_list(&mut self, nodes: Vec<NodeRef>) -> Handle {
        self.issue(Entry::NodeList(nodes))
    }

    pub fn get(&self, handle: Handle) -> Result<&Entry> {
        self.entries
            .get(&handle)
            .ok_or(BridgeError::UnknownHandle(handle))
    }

    /// Resolve a node entry of any kind, comments included.
    pub fn resolve_node(&self, handle: Handle) -> Result<NodeRef> {
        match self.get(handle)? {
            Entry::Node(r) => Ok(*r),
            Entry::NodeList(_) => Err(BridgeError::KindMismatch {
                handle,
                expected: "node",
            }),
        }
    }

    /// Resolve an element, document or text node.
    pub fn resolve_any(&self, handle: Handle) -> Result<NodeRef> {
        let r = self.resolve_node(handle)?;
        match r.kind {
            NodeKind::Other => Err(BridgeError::KindMismatch {
                handle,
                expected: "element or text node",
            }),
            _ => Ok(r),
        }
    }

    /// Resolve an element or document.
    pub fn resolve_element(&self, handle: Handle) -> Result<NodeRef> {
        let r = self.resolve_node(handle)?;
        if r.kind.is_element_like() {
            Ok(r)
        } else {
            Err(BridgeError::KindMismatch {
                handle,
                expected: "element",
            })
        }
    }

    /// Resolve a text node.
    pub fn resolve_text(&self, handle: Handle) -> Result<NodeRef> {
        let r = self.resolve_node(handle)?;
        if r.kind == NodeKind::Text {
            Ok(r)
        } else {
            Err(BridgeError::KindMismatch {
                handle,
                expected: "text node",
            })
        }
    }

    pub fn resolve_node_list(&self, handle: Handle) -> Result<&[NodeRef]> {
        match self.get(handle)? {
            Entry::NodeList(refs) => Ok(refs),
            Entry::Node(_) => Err(BridgeError::KindMismatch {
                handle,
                expected: "node list",
            }),
        }
    }

    /// Every node of `doc` referenced by a live entry, lists included.
    pub fn nodes_in(&self, doc: DocId) -> impl Iterator<Item = ArenaNodeId> + '_ {
        self.entries
            .values()
            .flat_map(|entry| match entry {
                Entry::Node(r) => std::slice::from_ref(r),
                Entry::NodeList(refs) => refs.as_slice(),
            })
            .filter(move |r| r.doc == doc)
            .map(|r| r.node)
    }

    /// Remove a handle. Unknown and already-freed handles are a no-op.
    pub fn free(&mut self, handle: Handle) -> Option<Entry> {
        let entry = self.entries.remove(&handle);
        if entry.is_some() {
            tracing::trace!(handle, "freed handle");
        }
        entry
    }

    /// Drop every entry and restart the counter.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.next = FIRST_HANDLE;
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
