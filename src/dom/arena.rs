//! Arena-based DOM tree.
//!
//! Every node of a document lives in one contiguous vector and is addressed
//! by an [`ArenaNodeId`]. Detaching a node only unlinks it. Slots of
//! subtrees that are neither attached to the document nor pinned by a caller
//! are reclaimed by [`ArenaDom::collect_garbage`] and reused by later
//! allocations.

use html5ever::{LocalName, Namespace, QualName, ns};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaNodeId(pub u32);

impl ArenaNodeId {
    /// Sentinel value for no node.
    pub const NONE: ArenaNodeId = ArenaNodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    /// Convert to `Option`, mapping the sentinel to `None`.
    pub fn get(self) -> Option<ArenaNodeId> {
        self.is_some().then_some(self)
    }
}

/// Node type in the arena DOM.
#[derive(Debug, Clone)]
pub enum ArenaNodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Cached id attribute, kept in sync by every attribute mutation.
        id: Option<String>,
        /// Cached class list, kept in sync by every attribute mutation.
        classes: Vec<String>,
    },
    /// Text content.
    Text(String),
    /// Comment.
    Comment(String),
    /// Document type declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena DOM.
#[derive(Debug, Clone)]
pub struct ArenaNode {
    pub data: ArenaNodeData,
    pub parent: ArenaNodeId,
    pub first_child: ArenaNodeId,
    pub last_child: ArenaNodeId,
    pub prev_sibling: ArenaNodeId,
    pub next_sibling: ArenaNodeId,
}

impl ArenaNode {
    fn new(data: ArenaNodeData) -> Self {
        Self {
            data,
            parent: ArenaNodeId::NONE,
            first_child: ArenaNodeId::NONE,
            last_child: ArenaNodeId::NONE,
            prev_sibling: ArenaNodeId::NONE,
            next_sibling: ArenaNodeId::NONE,
        }
    }
}

/// Build an attribute name in the null namespace, as the HTML parser does.
pub fn attr_name(local: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(local))
}

/// Build an element name in the HTML namespace.
pub fn html_name(local: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(local))
}

/// Re-derive the cached id and class list from an attribute list.
fn extract_id_and_classes(attrs: &[Attribute]) -> (Option<String>, Vec<String>) {
    let mut id = None;
    let mut classes = Vec::new();
    for attr in attrs {
        match attr.name.local.as_ref() {
            "id" => id = Some(attr.value.clone()),
            "class" => {
                classes = attr
                    .value
                    .split_whitespace()
                    .map(|s| s.to_string())
                    .collect();
            }
            _ => {}
        }
    }
    (id, classes)
}

/// Unreachable slots tolerated on top of twice the last live count.
const GC_SLACK: usize = 256;

/// Arena-based DOM tree.
///
/// Parent/child/sibling links use indices into the node vector. A `None`
/// slot has been reclaimed and is waiting on the free list.
#[derive(Debug, Clone)]
pub struct ArenaDom {
    nodes: Vec<Option<ArenaNode>>,
    vacant: Vec<ArenaNodeId>,
    document: ArenaNodeId,
    live_after_gc: usize,
}

impl ArenaDom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
            document: ArenaNodeId::NONE,
            live_after_gc: 0,
        };
        dom.document = dom.alloc(ArenaNode::new(ArenaNodeData::Document));
        dom
    }

    fn alloc(&mut self, node: ArenaNode) -> ArenaNodeId {
        if let Some(id) = self.vacant.pop() {
            self.nodes[id.0 as usize] = Some(node);
            return id;
        }
        let id = ArenaNodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> ArenaNodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: ArenaNodeId) -> Option<&ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: ArenaNodeId) -> Option<&mut ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Create a new, unattached element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> ArenaNodeId {
        let (id, classes) = extract_id_and_classes(&attrs);
        self.alloc(ArenaNode::new(ArenaNodeData::Element {
            name,
            attrs,
            id,
            classes,
        }))
    }

    /// Create a new, unattached text node.
    pub fn create_text(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Text(text)))
    }

    /// Create a new, unattached comment node.
    pub fn create_comment(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(
        &mut self,
        name: String,
        public_id: String,
        system_id: String,
    ) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append a child to a parent node.
    ///
    /// The child is detached from its current position first.
    pub fn append(&mut self, parent: ArenaNodeId, child: ArenaNodeId) {
        self.detach(child);

        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(ArenaNodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    ///
    /// The new node is detached from its current position first.
    pub fn insert_before(&mut self, sibling: ArenaNodeId, new_node: ArenaNodeId) {
        self.detach(new_node);

        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert a node as the first child of a parent.
    pub fn prepend(&mut self, parent: ArenaNodeId, child: ArenaNodeId) {
        match self.get(parent).and_then(|n| n.first_child.get()) {
            Some(first) => self.insert_before(first, child),
            None => self.append(parent, child),
        }
    }

    /// Append text to an existing trailing text node, or create a new one.
    pub fn append_text(&mut self, parent: ArenaNodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(ArenaNodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let ArenaNodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent and siblings.
    ///
    /// The node and its subtree stay in the arena and remain addressable.
    pub fn detach(&mut self, target: ArenaNodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = ArenaNodeId::NONE;
            node.prev_sibling = ArenaNodeId::NONE;
            node.next_sibling = ArenaNodeId::NONE;
        }
    }

    /// Detach every child of a node.
    pub fn remove_children(&mut self, parent: ArenaNodeId) {
        let children: Vec<_> = self.children(parent).collect();
        for child in children {
            self.detach(child);
        }
    }

    /// Move every child of `node` to the end of `new_parent`.
    pub fn reparent_children(&mut self, node: ArenaNodeId, new_parent: ArenaNodeId) {
        let children: Vec<_> = self.children(node).collect();
        for child in children {
            self.append(new_parent, child);
        }
    }

    /// Deep-copy a subtree of another DOM into this arena.
    ///
    /// Returns the id of the unattached copy of `root`.
    pub fn import(&mut self, source: &ArenaDom, root: ArenaNodeId) -> ArenaNodeId {
        let mut top = ArenaNodeId::NONE;
        // (source node, parent of its copy)
        let mut stack = vec![(root, ArenaNodeId::NONE)];
        while let Some((src, parent)) = stack.pop() {
            let Some(node) = source.get(src) else {
                continue;
            };
            let copy = self.alloc(ArenaNode::new(node.data.clone()));
            if parent.is_some() {
                self.append(parent, copy);
            } else {
                top = copy;
            }
            let start = stack.len();
            stack.extend(source.children(src).map(|child| (child, copy)));
            stack[start..].reverse();
        }
        top
    }

    /// Get the number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.vacant.len()
    }

    /// Check if the DOM holds nothing but its document root.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Whether enough nodes were allocated since the last collection to
    /// make another one worthwhile.
    pub fn needs_collection(&self) -> bool {
        self.len() > self.live_after_gc * 2 + GC_SLACK
    }

    /// Reclaim every node that is unreachable from both the document root
    /// and the subtrees containing `pinned`.
    ///
    /// A pinned node keeps its whole detached subtree alive, ancestors
    /// included, so any id a caller still holds keeps resolving to the same
    /// node. Returns the number of slots reclaimed.
    pub fn collect_garbage(&mut self, pinned: impl IntoIterator<Item = ArenaNodeId>) -> usize {
        let mut marked = vec![false; self.nodes.len()];
        let mut roots = vec![self.document];
        roots.extend(pinned.into_iter().map(|id| self.subtree_root(id)));

        for root in roots {
            let Some(seen) = marked.get_mut(root.0 as usize) else {
                continue;
            };
            if *seen || self.get(root).is_none() {
                continue;
            }
            *seen = true;
            for id in self.descendants(root) {
                marked[id.0 as usize] = true;
            }
        }

        let mut reclaimed = 0;
        for (i, slot) in self.nodes.iter_mut().enumerate() {
            if !marked[i] && slot.take().is_some() {
                self.vacant.push(ArenaNodeId(i as u32));
                reclaimed += 1;
            }
        }
        self.live_after_gc = self.len();
        reclaimed
    }

    /// The topmost ancestor of a node, or the node itself when detached.
    fn subtree_root(&self, id: ArenaNodeId) -> ArenaNodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: ArenaNodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(ArenaNodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over the strict descendants of a node in document order.
    pub fn descendants(&self, root: ArenaNodeId) -> Descendants<'_> {
        let mut stack: Vec<_> = self.children(root).collect();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Find the first node matching a predicate (DFS from the document).
    pub fn find<F>(&self, predicate: F) -> Option<ArenaNodeId>
    where
        F: Fn(&ArenaNode) -> bool,
    {
        std::iter::once(self.document)
            .chain(self.descendants(self.document))
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<ArenaNodeId> {
        self.find(|node| {
            if let ArenaNodeData::Element { name, .. } = &node.data {
                name.local.as_ref() == tag
            } else {
                false
            }
        })
    }
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a ArenaDom,
    current: ArenaNodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(ArenaNodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    dom: &'a ArenaDom,
    stack: Vec<ArenaNodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let len = self.stack.len();
        self.stack.extend(self.dom.children(id));
        self.stack[len..].reverse();
        Some(id)
    }
}

/// Navigation helpers.
impl ArenaDom {
    /// Parent of a node, if attached.
    pub fn parent(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        self.get(id).and_then(|n| n.parent.get())
    }

    /// Nearest following sibling that is an element.
    pub fn next_element_sibling(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        let mut current = self.get(id)?.next_sibling;
        while current.is_some() {
            if self.is_element(current) {
                return Some(current);
            }
            current = self.get(current)?.next_sibling;
        }
        None
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_element_sibling(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_some() {
            if self.is_element(current) {
                return Some(current);
            }
            current = self.get(current)?.prev_sibling;
        }
        None
    }

    /// Child elements of a node.
    pub fn element_children(&self, id: ArenaNodeId) -> impl Iterator<Item = ArenaNodeId> + '_ {
        self.children(id).filter(|&c| self.is_element(c))
    }
}

/// Convenience methods for element nodes.
impl ArenaDom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: ArenaNodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Get element's namespace.
    pub fn element_namespace(&self, id: ArenaNodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    /// Get an element's attribute list.
    pub fn attrs(&self, id: ArenaNodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                ArenaNodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: ArenaNodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value.
    ///
    /// Returns `false` if the node is not an element.
    pub fn set_attr(&mut self, id: ArenaNodeId, key: &str, value: &str) -> bool {
        self.update_attrs(id, |attrs| {
            match attrs.iter_mut().find(|a| a.name.local.as_ref() == key) {
                Some(existing) => existing.value = value.to_string(),
                None => attrs.push(Attribute {
                    name: attr_name(key),
                    value: value.to_string(),
                }),
            }
        })
    }

    /// Remove an attribute if present.
    ///
    /// Returns `false` if the node is not an element.
    pub fn remove_attr(&mut self, id: ArenaNodeId, key: &str) -> bool {
        self.update_attrs(id, |attrs| attrs.retain(|a| a.name.local.as_ref() != key))
    }

    /// Add each attribute whose qualified name the element does not carry yet.
    pub fn add_missing_attrs(&mut self, id: ArenaNodeId, extra: Vec<Attribute>) -> bool {
        self.update_attrs(id, |attrs| {
            for attr in extra {
                if !attrs.iter().any(|a| a.name == attr.name) {
                    attrs.push(attr);
                }
            }
        })
    }

    fn update_attrs(&mut self, id: ArenaNodeId, f: impl FnOnce(&mut Vec<Attribute>)) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        let ArenaNodeData::Element {
            attrs, id, classes, ..
        } = &mut node.data
        else {
            return false;
        };
        f(attrs);
        (*id, *classes) = extract_id_and_classes(attrs);
        true
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: ArenaNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    /// Get element's classes.
    pub fn element_classes(&self, id: ArenaNodeId) -> &[String] {
        self.get(id)
            .and_then(|n| match &n.data {
                ArenaNodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: ArenaNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, ArenaNodeData::Element { .. }))
    }

    /// Check if node is the document root.
    pub fn is_document(&self, id: ArenaNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, ArenaNodeData::Document))
    }

    /// Check if node is a text node.
    pub fn is_text(&self, id: ArenaNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, ArenaNodeData::Text(_)))
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: ArenaNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Replace the content of a text node.
    ///
    /// Returns `false` if the node is not a text node.
    pub fn set_text_content(&mut self, id: ArenaNodeId, text: &str) -> bool {
        match self.get_mut(id).map(|n| &mut n.data) {
            Some(ArenaNodeData::Text(existing)) => {
                *existing = text.to_string();
                true
            }
            _ => false,
        }
    }
}
