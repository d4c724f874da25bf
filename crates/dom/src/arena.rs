//! Arena-based document tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! This arena eliminates:
//! - Rc/Arc overhead (16 bytes per pointer)
//! - Recursive function calls (stack overflow risk)
//! - Cache misses (nodes stored sequentially)
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType, TextUnit};
use ahash::AHashMap;

/// Arena allocator for document nodes
///
/// Design:
/// - Single Vec<DomNode> for sequential allocation, `NodeId` is the index
/// - HashMap for backend_node_id → NodeId lookup (CDP uses backend IDs)
/// - No Rc/Arc: use indices everywhere
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for CDP integration)
    backend_id_map: AHashMap<u32, NodeId>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,

    /// Unit for text lengths and text offsets
    text_unit: TextUnit,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::with_capacity(capacity),
            root_id: None,
            text_unit: TextUnit::default(),
        }
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        if let Some(backend_id) = node.backend_node_id {
            self.backend_id_map.insert(backend_id, node_id);
        }
        self.nodes.push(node);
        node_id
    }

    /// Attach `child` as the last child of `parent`
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        if !self.get(parent_id)?.node_type.is_container() {
            return Err(DomError::InvalidNodeType {
                expected: "element or document".to_string(),
                actual: format!("{:?}", self.get(parent_id)?.node_type),
            });
        }
        if self.is_inclusive_ancestor(child_id, parent_id) {
            return Err(DomError::InvalidRange(format!(
                "appending node {} under {} would create a cycle",
                child_id, parent_id
            )));
        }

        let child = self.get_mut(child_id)?;
        if child.parent_id.is_some() {
            return Err(DomError::InvalidRange(format!(
                "node {} already has a parent",
                child_id
            )));
        }
        child.parent_id = Some(parent_id);
        self.get_mut(parent_id)?.children_ids.push(child_id);
        Ok(())
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: u32) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::CdpError("No root node set".to_string()))?;
        self.get(root_id)
    }

    /// The document element: first element child of a document root,
    /// or the root itself when it is an element
    pub fn document_element(&self) -> Option<NodeId> {
        let root = self.root().ok()?;
        match root.node_type {
            NodeType::Element => Some(root.node_id),
            _ => self.element_children(root.node_id).next(),
        }
    }

    pub fn text_unit(&self) -> TextUnit {
        self.text_unit
    }

    pub fn set_text_unit(&mut self, unit: TextUnit) {
        self.text_unit = unit;
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element children of a node, in document order (`ParentNode.children`)
    pub fn element_children(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node_id as usize)
            .map(|node| node.children_ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(|&child_id| self.get(child_id).map_or(false, DomNode::is_element))
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Ancestor chain starting at the node itself
    pub fn inclusive_ancestors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(
            self.get(node_id).ok().map(|node| node.node_id),
            move |&id| self.get(id).ok().and_then(|node| node.parent_id),
        )
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        self.inclusive_ancestors(node_id).any(|id| id == ancestor)
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// This is the "good taste" version - no special cases for leaf nodes
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Find nodes matching predicate
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .filter(|node| predicate(node))
            .map(|node| node.node_id)
            .collect()
    }

    /// Find first node matching predicate (in allocation order)
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.nodes
            .iter()
            .find(|node| predicate(node))
            .map(|node| node.node_id)
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.node_name.eq_ignore_ascii_case(tag))
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_element() && node.attr("id") == Some(id))
    }

    /// Find the first text node whose value equals `value`
    pub fn find_text(&self, value: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_text() && node.node_value == value)
    }

    /// Length of a node in the DOM sense: text units for character data,
    /// number of children for everything else
    pub fn node_length(&self, node_id: NodeId) -> Result<usize> {
        let node = self.get(node_id)?;
        if node.is_text() {
            Ok(self.text_unit.len(&node.node_value))
        } else {
            Ok(node.children_ids.len())
        }
    }

    /// Concatenated character data under a node (`Node.textContent`)
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        let mut text = String::new();

        self.traverse_df(node_id, |node| {
            if node.is_text() {
                text.push_str(&node.node_value);
            }
            Ok(())
        })?;

        Ok(text)
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.backend_id_map.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        assert!(arena.is_empty());

        let mut node = DomNode::element("div");
        node.backend_node_id = Some(100);

        let id = arena.add_node(node);
        assert_eq!(id, 0);
        assert_eq!(arena.len(), 1);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.node_id, 0);
        assert_eq!(arena.get_by_backend_id(100).unwrap().node_id, 0);
    }

    #[test]
    fn test_append_child_links_both_ways() {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::element("div"));
        let child = arena.add_node(DomNode::text("hi"));
        arena.append_child(root, child).unwrap();

        assert_eq!(arena.get(child).unwrap().parent_id, Some(root));
        assert_eq!(arena.get(root).unwrap().children_ids.as_slice(), &[child]);
        assert!(arena.is_inclusive_ancestor(root, child));
        assert!(!arena.is_inclusive_ancestor(child, root));
    }

    #[test]
    fn test_append_child_rejects_cycles_and_text_parents() {
        let mut arena = DomArena::new();
        let outer = arena.add_node(DomNode::element("div"));
        let inner = arena.add_node(DomNode::element("span"));
        let text = arena.add_node(DomNode::text("x"));
        arena.append_child(outer, inner).unwrap();

        assert!(arena.append_child(inner, outer).is_err());
        assert!(matches!(
            arena.append_child(text, inner),
            Err(DomError::InvalidNodeType { .. })
        ));
    }

    #[test]
    fn test_traverse_df() {
        let mut arena = DomArena::new();

        // Create tree: root -> [child1, child2]
        let root_id = arena.add_node(DomNode::element("div"));
        let id1 = arena.add_node(DomNode::element("span"));
        let id2 = arena.add_node(DomNode::element("span"));
        arena.append_child(root_id, id1).unwrap();
        arena.append_child(root_id, id2).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(root_id, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["div", "span", "span"]);
    }

    #[test]
    fn test_element_children_skip_text() {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::element("p"));
        let text = arena.add_node(DomNode::text("a"));
        let b = arena.add_node(DomNode::element("b"));
        arena.append_child(root, text).unwrap();
        arena.append_child(root, b).unwrap();

        assert_eq!(arena.element_children(root).collect::<Vec<_>>(), vec![b]);
        assert_eq!(arena.node_length(root).unwrap(), 2);
        assert_eq!(arena.node_length(text).unwrap(), 1);
    }
}
