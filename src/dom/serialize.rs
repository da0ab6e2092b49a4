//! HTML5 serialization of arena nodes through html5ever's serializer.
//!
//! The walk is driven by an explicit op stack, so nesting depth is bounded
//! by the heap rather than the call stack.

use std::io;

use html5ever::QualName;
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// A node of an [`ArenaDom`] that html5ever can serialize.
struct SerializableNode<'a> {
    dom: &'a ArenaDom,
    id: ArenaNodeId,
    include_node: bool,
}

enum SerializeOp<'a> {
    Open(ArenaNodeId),
    Close(&'a QualName),
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, _scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let dom = self.dom;
        let mut ops: Vec<SerializeOp<'_>> = if self.include_node {
            vec![SerializeOp::Open(self.id)]
        } else {
            children_rev(dom, self.id)
        };

        while let Some(op) = ops.pop() {
            let id = match op {
                SerializeOp::Close(name) => {
                    serializer.end_elem(name.clone())?;
                    continue;
                }
                SerializeOp::Open(id) => id,
            };
            let Some(node) = dom.get(id) else {
                continue;
            };
            match &node.data {
                // A document has no markup of its own.
                ArenaNodeData::Document => ops.extend(children_rev(dom, id)),
                ArenaNodeData::Element { name, attrs, .. } => {
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|a| (&a.name, a.value.as_str())),
                    )?;
                    ops.push(SerializeOp::Close(name));
                    ops.extend(children_rev(dom, id));
                }
                ArenaNodeData::Text(text) => serializer.write_text(text)?,
                ArenaNodeData::Comment(text) => serializer.write_comment(text)?,
                ArenaNodeData::Doctype { name, .. } => serializer.write_doctype(name)?,
            }
        }
        Ok(())
    }
}

fn children_rev<'a>(dom: &ArenaDom, id: ArenaNodeId) -> Vec<SerializeOp<'a>> {
    let mut children: Vec<_> = dom.children(id).map(SerializeOp::Open).collect();
    children.reverse();
    children
}

/// Run the serializer with `context` as the enclosing element, which
/// decides whether text is escaped (it is not inside `script` or `style`).
fn render(dom: &ArenaDom, id: ArenaNodeId, include_node: bool, context: Option<ArenaNodeId>) -> String {
    let parent = context.and_then(|p| match dom.get(p).map(|n| &n.data) {
        Some(ArenaNodeData::Element { name, .. }) => Some(name.clone()),
        _ => None,
    });
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(parent),
        ..Default::default()
    };
    let node = SerializableNode {
        dom,
        id,
        include_node,
    };

    let mut bytes = Vec::new();
    if let Err(err) = serialize(&mut bytes, &node, opts) {
        tracing::debug!(%err, "serialization failed");
    }
    String::from_utf8(bytes).unwrap_or_default()
}

/// Serialize a node including its own tags.
///
/// A document serializes as its children, since it has no markup of its own.
pub fn outer_html(dom: &ArenaDom, id: ArenaNodeId) -> String {
    render(dom, id, true, dom.parent(id))
}

/// Serialize the children of a node.
pub fn inner_html(dom: &ArenaDom, id: ArenaNodeId) -> String {
    render(dom, id, false, Some(id))
}
