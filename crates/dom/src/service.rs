//! DOM Service - builds documents from CDP snapshots
//!
//! This handles:
//! - Parsing CDP `DOM.getDocument` JSON responses
//! - Document tree construction in the arena
//!
//! Shadow roots and iframe content documents are not attached: they are not
//! part of the light-DOM text a browser range reports.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::*;
use serde_json::Value;

/// Configuration for DOM service
#[derive(Debug, Clone, Default)]
pub struct DomServiceConfig {
    /// Unit used for text lengths in the produced arena
    pub text_unit: TextUnit,
}

/// Main DOM service
pub struct DomService {
    config: DomServiceConfig,
    arena: DomArena,
}

impl DomService {
    /// Create new DOM service with default config
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Self {
        let mut arena = DomArena::new();
        arena.set_text_unit(config.text_unit);
        Self { config, arena }
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Hand the arena over to the caller
    pub fn into_arena(self) -> DomArena {
        self.arena
    }

    /// Parse CDP DOM tree response and build arena
    ///
    /// Input format matches CDP's DOM.getDocument response:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    pub fn parse_cdp_dom_tree(&mut self, cdp_response: &Value) -> Result<NodeId> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        self.arena.clear();
        self.arena.set_text_unit(self.config.text_unit);

        let root_id = self.arena.add_node(Self::parse_node(root)?);
        self.arena.set_root(root_id)?;

        // Iterative: deeply nested pages must not blow the stack
        let mut pending = vec![(root, root_id)];
        while let Some((cdp_node, node_id)) = pending.pop() {
            let Some(children) = cdp_node["children"].as_array() else {
                continue;
            };
            for child in children {
                let child_id = self.arena.add_node(Self::parse_node(child)?);
                self.arena.append_child(node_id, child_id)?;
                pending.push((child, child_id));
            }
        }

        tracing::debug!("parsed CDP document with {} nodes", self.arena.len());
        Ok(root_id)
    }

    /// Parse a single CDP node, without its children
    fn parse_node(cdp_node: &Value) -> Result<DomNode> {
        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?;

        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = cdp_node["nodeName"].as_str().unwrap_or("");
        let mut node = DomNode::new(node_type, node_name);
        node.node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();
        node.backend_node_id = cdp_node["backendNodeId"]
            .as_u64()
            .and_then(|id| u32::try_from(id).ok());

        // Attributes arrive flattened: [name0, value0, name1, value1, ...]
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    node.attributes.insert(key.to_string(), value.to_string());
                }
            }
        }

        Ok(node)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}
