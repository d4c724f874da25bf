//! Host collaborator traits
//!
//! The selector codec never touches a concrete tree type. It reads tree shape
//! through [`TreeShape`], runs structural queries through [`TreeQuery`] and
//! turns anchors into host ranges through [`RangeMaterializer`]. `DomArena`
//! implements all three; a browser binding or any other tree can do the same.

use crate::arena::DomArena;
use crate::range::DomRange;
use crate::types::{DomNode, NodeId, NodeType};
use crate::DomError;
use std::fmt;
use std::hash::Hash;

/// Position inside one text leaf's character stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor<N> {
    pub node: N,
    pub offset: usize,
}

impl<N> Anchor<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// DOM boundary point. `offset` counts text units when `container` is a
/// text leaf and children otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint<N> {
    pub container: N,
    pub offset: usize,
}

impl<N> BoundaryPoint<N> {
    pub fn new(container: N, offset: usize) -> Self {
        Self { container, offset }
    }
}

impl<N> From<Anchor<N>> for BoundaryPoint<N> {
    fn from(anchor: Anchor<N>) -> Self {
        Self {
            container: anchor.node,
            offset: anchor.offset,
        }
    }
}

/// What the traversal needs to know about a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Document or fragment: has children, is not an element
    Document,
    /// Comments, processing instructions, doctypes
    Other,
}

impl NodeKind {
    pub fn has_children(self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Document)
    }
}

/// Read-only view of a document tree
pub trait TreeShape {
    type Node: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Ordered children (all kinds)
    fn children(&self, node: Self::Node) -> &[Self::Node];

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Lowercase local name for elements
    fn tag_name(&self, node: Self::Node) -> Option<String>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Length of a text leaf in the host's text unit, 0 for other nodes
    fn text_len(&self, node: Self::Node) -> usize;

    /// Top-level element of the document
    fn document_element(&self) -> Option<Self::Node>;

    /// Native equivalent of "length of the text between the start of `root`
    /// and `point`", when the host has one (`Range.toString().length` in a
    /// browser). `None` makes callers fall back to a text scan.
    fn native_text_offset(
        &self,
        root: Self::Node,
        point: BoundaryPoint<Self::Node>,
    ) -> Option<usize> {
        let _ = (root, point);
        None
    }

    /// `Node.parentElement`
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node> {
        self.parent(node)
            .filter(|&parent| self.kind(parent) == NodeKind::Element)
    }
}

/// Structural query provider
pub trait TreeQuery: TreeShape {
    /// First descendant of `scope` matching `selector`, `None` when nothing
    /// matches or the selector cannot be parsed
    fn query_selector(&self, scope: Self::Node, selector: &str) -> Option<Self::Node>;
}

/// Builds host-native ranges
pub trait RangeMaterializer: TreeShape {
    type Range;
    type Error: fmt::Display;

    fn create_range(
        &self,
        start: Anchor<Self::Node>,
        end: Anchor<Self::Node>,
    ) -> Result<Self::Range, Self::Error>;

    /// Range spanning the whole node (`Range.selectNode`)
    fn select_node(&self, node: Self::Node) -> Result<Self::Range, Self::Error>;

    fn bounds(&self, range: &Self::Range) -> (BoundaryPoint<Self::Node>, BoundaryPoint<Self::Node>);

    /// `Range.commonAncestorContainer`
    fn common_ancestor(&self, range: &Self::Range) -> Option<Self::Node>;
}

impl From<NodeType> for NodeKind {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Element => NodeKind::Element,
            NodeType::Text | NodeType::CdataSection => NodeKind::Text,
            NodeType::Document | NodeType::DocumentFragment => NodeKind::Document,
            _ => NodeKind::Other,
        }
    }
}

impl TreeShape for DomArena {
    type Node = NodeId;

    fn kind(&self, node: NodeId) -> NodeKind {
        self.get(node)
            .map_or(NodeKind::Other, |n| NodeKind::from(n.node_type))
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        match self.get(node) {
            Ok(n) => n.children_ids.as_slice(),
            Err(_) => &[],
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).ok().and_then(|n| n.parent_id)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.get(node).ok().and_then(DomNode::tag_name)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node).ok().and_then(|n| n.attr(name))
    }

    fn text_len(&self, node: NodeId) -> usize {
        match self.get(node) {
            Ok(n) if n.is_text() => self.text_unit().len(&n.node_value),
            _ => 0,
        }
    }

    fn document_element(&self) -> Option<NodeId> {
        DomArena::document_element(self)
    }

    fn native_text_offset(&self, root: NodeId, point: BoundaryPoint<NodeId>) -> Option<usize> {
        self.text_offset(root, point).ok()
    }
}

impl TreeQuery for DomArena {
    fn query_selector(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        match DomArena::query_selector(self, scope, selector) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!("query_selector rejected: {}", err);
                None
            }
        }
    }
}

impl RangeMaterializer for DomArena {
    type Range = DomRange;
    type Error = DomError;

    fn create_range(
        &self,
        start: Anchor<NodeId>,
        end: Anchor<NodeId>,
    ) -> Result<DomRange, DomError> {
        DomArena::create_range(self, start.into(), end.into())
    }

    fn select_node(&self, node: NodeId) -> Result<DomRange, DomError> {
        self.select_node_range(node)
    }

    fn bounds(&self, range: &DomRange) -> (BoundaryPoint<NodeId>, BoundaryPoint<NodeId>) {
        (range.start, range.end)
    }

    fn common_ancestor(&self, range: &DomRange) -> Option<NodeId> {
        self.common_ancestor_container(range).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;

    #[test]
    fn test_arena_tree_shape() {
        let mut b = DocumentBuilder::new();
        b.open("DIV").attr("id", "a").text("héllo").comment("c").close();
        let arena = b.build();

        let root = arena.root_id().unwrap();
        let div = arena.find_by_id("a").unwrap();
        let text = arena.find_text("héllo").unwrap();

        assert_eq!(TreeShape::kind(&arena, root), NodeKind::Document);
        assert_eq!(TreeShape::kind(&arena, div), NodeKind::Element);
        assert_eq!(TreeShape::kind(&arena, text), NodeKind::Text);
        assert_eq!(TreeShape::tag_name(&arena, div).as_deref(), Some("div"));
        assert_eq!(TreeShape::text_len(&arena, text), 5);
        assert_eq!(TreeShape::text_len(&arena, div), 0);
        assert_eq!(TreeShape::children(&arena, div).len(), 2);
        assert_eq!(arena.parent_element(div), None);
        assert_eq!(arena.parent_element(text), Some(div));
        assert_eq!(TreeShape::document_element(&arena), Some(div));
    }

    #[test]
    fn test_query_selector_swallows_syntax_errors() {
        let arena = DocumentBuilder::new().build();
        let root = arena.root_id().unwrap();
        assert_eq!(TreeQuery::query_selector(&arena, root, "p:hover"), None);
    }
}
