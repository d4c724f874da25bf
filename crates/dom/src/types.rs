//! Core type definitions for the document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for child lists (most nodes have few children)
//! 3. Text lengths are measured in a per-document unit, see [`TextUnit`]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// Node type matching DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }

    /// Character data that counts towards text content (`Text` and `CDATASection`)
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeType::Text | NodeType::CdataSection)
    }

    /// Nodes whose children take part in tree traversal
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment
        )
    }
}

/// Unit used to measure text length and text offsets.
///
/// Browsers report `Text.length` in UTF-16 code units, so that is the default:
/// offsets recorded in a browser resolve to the same characters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextUnit {
    #[default]
    Utf16,
    Char,
}

impl TextUnit {
    /// Length of `text` in this unit
    pub fn len(self, text: &str) -> usize {
        match self {
            TextUnit::Utf16 => text.encode_utf16().count(),
            TextUnit::Char => text.chars().count(),
        }
    }

    /// Byte index of the unit offset `offset` inside `text`.
    ///
    /// Returns `None` when `offset` is past the end. An offset that lands in
    /// the middle of a surrogate pair maps to the start of that character.
    pub fn byte_index(self, text: &str, offset: usize) -> Option<usize> {
        let mut units = 0;
        for (byte, ch) in text.char_indices() {
            let width = match self {
                TextUnit::Utf16 => ch.len_utf16(),
                TextUnit::Char => 1,
            };
            if units + width > offset {
                return Some(byte);
            }
            units += width;
        }
        (units == offset).then_some(text.len())
    }
}

/// The main document tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    /// Index of this node in its arena (assigned by `DomArena::add_node`)
    pub node_id: NodeId,
    /// Backend node ID when the node came from CDP
    pub backend_node_id: Option<u32>,
    pub node_type: NodeType,

    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,

    pub node_name: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,
}

impl DomNode {
    /// Create a detached node
    pub fn new(node_type: NodeType, node_name: impl Into<String>) -> Self {
        Self {
            node_id: 0,
            backend_node_id: None,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name: node_name.into(),
            node_value: String::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeType::Element, tag)
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Text, "#text");
        node.node_value = value.into();
        node
    }

    /// Get tag name for element nodes, lowercased like `Element.localName`
    pub fn tag_name(&self) -> Option<String> {
        if self.node_type == NodeType::Element {
            Some(self.node_name.to_ascii_lowercase())
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type.is_character_data()
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Whitespace separated class list
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }
}
