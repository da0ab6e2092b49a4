//! Ownership of parsed documents.
//!
//! Registry entries only hold `(DocId, ArenaNodeId)` pairs; the trees
//! themselves live here. Each entry that points into a document holds a
//! lease on it, and a document is dropped as soon as its last lease is
//! released, so freeing handles actually reclaims memory.

use std::collections::HashMap;

use crate::dom::ArenaDom;
use crate::error::{BridgeError, Result};

/// Identifier of a document in the store.
///
/// Never exposed to the host; documents are reached through node handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(u64);

/// A document tree plus its base URI.
#[derive(Debug)]
pub struct DocEntry {
    pub dom: ArenaDom,
    pub base_uri: String,
    leases: usize,
}

/// All live documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: HashMap<DocId, DocEntry>,
    next: u64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document with no leases.
    ///
    /// The caller is expected to issue a handle into it right away.
    pub fn insert(&mut self, dom: ArenaDom, base_uri: impl Into<String>) -> DocId {
        let id = DocId(self.next);
        self.next += 1;
        self.docs.insert(
            id,
            DocEntry {
                dom,
                base_uri: base_uri.into(),
                leases: 0,
            },
        );
        id
    }

    pub fn get(&self, id: DocId) -> Result<&DocEntry> {
        self.docs.get(&id).ok_or(BridgeError::DetachedNode)
    }

    pub fn get_mut(&mut self, id: DocId) -> Result<&mut DocEntry> {
        self.docs.get_mut(&id).ok_or(BridgeError::DetachedNode)
    }

    /// Take a lease on a document.
    pub fn acquire(&mut self, id: DocId) {
        if let Some(entry) = self.docs.get_mut(&id) {
            entry.leases += 1;
        }
    }

    /// Give back a lease, dropping the document when none remain.
    ///
    /// Returns `true` if the document was dropped.
    pub fn release(&mut self, id: DocId) -> bool {
        let Some(entry) = self.docs.get_mut(&id) else {
            return false;
        };
        entry.leases = entry.leases.saturating_sub(1);
        if entry.leases > 0 {
            return false;
        }
        self.docs.remove(&id);
        tracing::trace!(doc = id.0, "dropped document");
        true
    }

    /// Number of leases currently held on a document.
    pub fn leases(&self, id: DocId) -> usize {
        self.docs.get(&id).map_or(0, |e| e.leases)
    }

    /// Drop every document.
    pub fn clear(&mut self) {
        self.docs.clear();
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    #[test]
    fn test_insert_and_get() {
        let mut store = DocumentStore::new();
        let id = store.insert(parse_document("<p>x</p>"), "https://example.com/");
        assert_eq!(store.get(id).unwrap().base_uri, "https://example.com/");
        assert!(store.get(id).unwrap().dom.find_by_tag("p").is_some());
    }

    #[test]
    fn test_last_release_drops() {
        let mut store = DocumentStore::new();
        let id = store.insert(ArenaDom::new(), "");
        store.acquire(id);
        store.acquire(id);
        assert_eq!(store.leases(id), 2);

        assert!(!store.release(id));
        assert_eq!(store.len(), 1);
        assert!(store.release(id));
        assert!(store.is_empty());
        assert_eq!(store.get(id).unwrap_err(), BridgeError::DetachedNode);
    }

    #[test]
    fn test_release_unknown_is_noop() {
        let mut store = DocumentStore::new();
        let id = store.insert(ArenaDom::new(), "");
        store.acquire(id);
        assert!(store.release(id));
        assert!(!store.release(id));
    }

    #[test]
    fn test_ids_not_reused() {
        let mut store = DocumentStore::new();
        let a = store.insert(ArenaDom::new(), "");
        store.acquire(a);
        store.release(a);
        let b = store.insert(ArenaDom::new(), "");
        assert_ne!(a, b);
    }
}
