//! DOM ranges over the arena
//!
//! Boundary points follow DOM semantics: offsets inside text nodes count text
//! units (see `TextUnit`), offsets inside elements count children.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::host::BoundaryPoint;
use crate::types::{NodeId, NodeType};
use std::cmp::Ordering;

/// A live range: two boundary points in the same tree, start not after end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: BoundaryPoint<NodeId>,
    pub end: BoundaryPoint<NodeId>,
}

impl DomRange {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

impl DomArena {
    /// Build a range, rejecting what `Range.setStart`/`setEnd` would reject
    pub fn create_range(
        &self,
        start: BoundaryPoint<NodeId>,
        end: BoundaryPoint<NodeId>,
    ) -> Result<DomRange> {
        self.check_point(start)?;
        self.check_point(end)?;

        if self.tree_root(start.container) != self.tree_root(end.container) {
            return Err(DomError::InvalidRange(format!(
                "nodes {} and {} are in disconnected subtrees",
                start.container, end.container
            )));
        }
        if self.compare_points(start, end)? == Ordering::Greater {
            return Err(DomError::InvalidRange(format!(
                "end ({}, {}) precedes start ({}, {})",
                end.container, end.offset, start.container, start.offset
            )));
        }

        Ok(DomRange { start, end })
    }

    fn check_point(&self, point: BoundaryPoint<NodeId>) -> Result<()> {
        let node = self.get(point.container)?;
        if node.node_type == NodeType::DocumentType {
            return Err(DomError::InvalidNodeType {
                expected: "non-doctype boundary container".to_string(),
                actual: "DocumentType".to_string(),
            });
        }
        let length = self.node_length(point.container)?;
        if point.offset > length {
            return Err(DomError::IndexSize {
                node: point.container,
                offset: point.offset,
                length,
            });
        }
        Ok(())
    }

    /// Range around `node` inside its parent (`Range.selectNode`)
    pub fn select_node_range(&self, node_id: NodeId) -> Result<DomRange> {
        let parent_id = self.get(node_id)?.parent_id.ok_or_else(|| {
            DomError::InvalidRange(format!("node {} has no parent to select it in", node_id))
        })?;
        let index = self
            .get(parent_id)?
            .children_ids
            .iter()
            .position(|&child| child == node_id)
            .ok_or(DomError::NodeNotFound(node_id))?;

        Ok(DomRange {
            start: BoundaryPoint::new(parent_id, index),
            end: BoundaryPoint::new(parent_id, index + 1),
        })
    }

    /// Topmost inclusive ancestor of a node
    pub fn tree_root(&self, node_id: NodeId) -> NodeId {
        self.inclusive_ancestors(node_id).last().unwrap_or(node_id)
    }

    /// `Range.commonAncestorContainer`
    pub fn common_ancestor_container(&self, range: &DomRange) -> Result<NodeId> {
        let start_chain: Vec<NodeId> = self.inclusive_ancestors(range.start.container).collect();
        self.inclusive_ancestors(range.end.container)
            .find(|id| start_chain.contains(id))
            .ok_or_else(|| {
                DomError::InvalidRange(format!(
                    "nodes {} and {} share no ancestor",
                    range.start.container, range.end.container
                ))
            })
    }

    /// Document order of two nodes in the same tree
    pub fn compare_nodes(&self, a: NodeId, b: NodeId) -> Result<Ordering> {
        if a == b {
            return Ok(Ordering::Equal);
        }
        let mut chain_a: Vec<NodeId> = self.inclusive_ancestors(a).collect();
        let mut chain_b: Vec<NodeId> = self.inclusive_ancestors(b).collect();
        chain_a.reverse();
        chain_b.reverse();

        if chain_a.first() != chain_b.first() {
            return Err(DomError::InvalidRange(format!(
                "nodes {} and {} are in disconnected subtrees",
                a, b
            )));
        }

        let split = chain_a
            .iter()
            .zip(chain_b.iter())
            .take_while(|(x, y)| x == y)
            .count();
        if split == chain_a.len() {
            return Ok(Ordering::Less);
        }
        if split == chain_b.len() {
            return Ok(Ordering::Greater);
        }

        let siblings = &self.get(chain_a[split - 1])?.children_ids;
        let index_a = siblings.iter().position(|&id| id == chain_a[split]);
        let index_b = siblings.iter().position(|&id| id == chain_b[split]);
        Ok(index_a.cmp(&index_b))
    }

    /// Position of boundary point `a` relative to `b`
    pub fn compare_points(
        &self,
        a: BoundaryPoint<NodeId>,
        b: BoundaryPoint<NodeId>,
    ) -> Result<Ordering> {
        if a.container == b.container {
            return Ok(a.offset.cmp(&b.offset));
        }
        if self.compare_nodes(a.container, b.container)? == Ordering::Greater {
            return Ok(self.compare_points(b, a)?.reverse());
        }
        if self.is_inclusive_ancestor(a.container, b.container) {
            let child = self
                .inclusive_ancestors(b.container)
                .find(|&id| self.get(id).ok().and_then(|n| n.parent_id) == Some(a.container))
                .ok_or(DomError::NodeNotFound(b.container))?;
            let index = self
                .get(a.container)?
                .children_ids
                .iter()
                .position(|&id| id == child)
                .unwrap_or(0);
            if index < a.offset {
                return Ok(Ordering::Greater);
            }
        }
        Ok(Ordering::Less)
    }

    /// Text units between the start of `root` and `point`
    pub fn text_offset(&self, root: NodeId, point: BoundaryPoint<NodeId>) -> Result<usize> {
        if !self.is_inclusive_ancestor(root, point.container) {
            return Err(DomError::InvalidRange(format!(
                "node {} is not inside {}",
                point.container, root
            )));
        }
        self.check_point(point)?;

        let container = self.get(point.container)?;
        let (stop, extra) = if container.is_text() {
            (Some(point.container), point.offset)
        } else if let Some(&child) = container.children_ids.get(point.offset) {
            (Some(child), 0)
        } else {
            (self.next_outside(point.container, root), 0)
        };

        let unit = self.text_unit();
        let mut total = 0;
        let mut stack = vec![root];
        while let Some(node_id) = stack.pop() {
            if Some(node_id) == stop {
                break;
            }
            let node = self.get(node_id)?;
            if node.is_text() {
                total += unit.len(&node.node_value);
            } else if node.node_type.is_container() {
                stack.extend(node.children_ids.iter().rev());
            }
        }
        Ok(total + extra)
    }

    /// First node after the subtree of `node` in preorder, without leaving `root`
    fn next_outside(&self, node_id: NodeId, root: NodeId) -> Option<NodeId> {
        let mut current = node_id;
        while current != root {
            let parent = self.get(current).ok()?.parent_id?;
            let siblings = &self.get(parent).ok()?.children_ids;
            let index = siblings.iter().position(|&id| id == current)?;
            if let Some(&next) = siblings.get(index + 1) {
                return Some(next);
            }
            current = parent;
        }
        None
    }

    /// Text selected by a range (`Range.toString`)
    pub fn range_text(&self, range: &DomRange) -> Result<String> {
        let root = self.tree_root(range.start.container);
        let start = self.text_offset(root, range.start)?;
        let end = self.text_offset(root, range.end)?;
        if end <= start {
            return Ok(String::new());
        }

        let text = self.text_content(root)?;
        let unit = self.text_unit();
        let from = unit.byte_index(&text, start).unwrap_or(text.len());
        let to = unit.byte_index(&text, end).unwrap_or(text.len());
        Ok(text[from..to].to_string())
    }
}
