//! Programmatic document construction
//!
//! ```
//! use dom::DocumentBuilder;
//!
//! let mut builder = DocumentBuilder::new();
//! builder
//!     .open("div").attr("id", "a")
//!     .open("p").text("Hello ")
//!     .open("b").text("world").close()
//!     .close()
//!     .close();
//! let arena = builder.build();
//! assert_eq!(arena.text_content(arena.find_by_id("a").unwrap()).unwrap(), "Hello world");
//! ```

use crate::arena::DomArena;
use crate::types::{DomNode, NodeId, NodeType};

/// Cursor-style builder: `open` descends into a new element, `close` returns
/// to its parent. The arena root is a `#document` node.
#[derive(Debug)]
pub struct DocumentBuilder {
    arena: DomArena,
    stack: Vec<NodeId>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut arena = DomArena::new();
        let document = arena.add_node(DomNode::new(NodeType::Document, "#document"));
        // The node was just added, set_root cannot fail
        let _ = arena.set_root(document);
        Self {
            arena,
            stack: vec![document],
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(0)
    }

    fn append(&mut self, node: DomNode) -> NodeId {
        let parent = self.current();
        let id = self.arena.add_node(node);
        if let Err(err) = self.arena.append_child(parent, id) {
            tracing::debug!("builder failed to append node {}: {}", id, err);
        }
        id
    }

    /// Append an element and make it the current node
    pub fn open(&mut self, tag: &str) -> &mut Self {
        let id = self.append(DomNode::element(tag));
        self.stack.push(id);
        self
    }

    /// Set an attribute on the current element
    pub fn attr(&mut self, name: &str, value: &str) -> &mut Self {
        let current = self.current();
        if let Ok(node) = self.arena.get_mut(current) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Append a text node to the current element
    pub fn text(&mut self, value: &str) -> &mut Self {
        self.append(DomNode::text(value));
        self
    }

    /// Append a comment node to the current element
    pub fn comment(&mut self, value: &str) -> &mut Self {
        let mut node = DomNode::new(NodeType::Comment, "#comment");
        node.node_value = value.to_string();
        self.append(node);
        self
    }

    /// Return to the parent of the current element
    pub fn close(&mut self) -> &mut Self {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self
    }

    pub fn build(self) -> DomArena {
        self.arena
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
