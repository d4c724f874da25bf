//! Structural paths to elements
//!
//! A path is built from the target upward and reads root-to-target:
//!
//! ```text
//! #a > p:nth-child(1) > b:nth-child(1)
//! ```
//!
//! The first ancestor carrying an id ends the walk, so paths stay short and
//! survive edits outside that ancestor.

use crate::config::CodecConfig;
use crate::scanner::{fold_nodes, Step};
use crate::selector::Selector;
use dom::{escape_identifier, quote_string, NodeKind, TreeShape};

/// Builds `CssSelector` paths
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    config: CodecConfig,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Path from `boundary` (exclusive) down to `target`.
    ///
    /// Without a boundary, or when `boundary` is not an ancestor, the walk
    /// runs up to the document element.
    pub fn path_of<T>(&self, tree: &T, target: T::Node, boundary: Option<T::Node>) -> String
    where
        T: TreeShape + ?Sized,
    {
        let mut fragments = Vec::new();
        let mut current = Some(target);

        while let Some(node) = current {
            if Some(node) == boundary || tree.kind(node) != NodeKind::Element {
                break;
            }
            if let Some(fragment) = self.id_fragment(tree, node) {
                fragments.push(fragment);
                break;
            }

            let tag = tree
                .tag_name(node)
                .map_or_else(|| "*".to_string(), |tag| escape_identifier(&tag));
            let parent = tree.parent_element(node);
            match parent {
                Some(parent) => {
                    let position = element_position(tree, parent, node);
                    fragments.push(format!("{}:nth-child({})", tag, position));
                }
                None => fragments.push(tag),
            }
            current = parent;
        }

        fragments.reverse();
        fragments.join(" > ")
    }

    /// Unrefined selector for a single element, addressed from the document
    pub fn target_selector<T>(&self, tree: &T, element: T::Node) -> Selector
    where
        T: TreeShape + ?Sized,
    {
        Selector::css(self.path_of(tree, element, None))
    }

    fn id_fragment<T>(&self, tree: &T, node: T::Node) -> Option<String>
    where
        T: TreeShape + ?Sized,
    {
        let attribute = self.config.id_attribute.as_str();
        let id = tree.attribute(node, attribute).filter(|id| !id.is_empty())?;

        if self.config.verify_unique_ids && count_carriers(tree, node, attribute, id) > 1 {
            tracing::debug!("id '{}' is not unique, falling back to position", id);
            return None;
        }

        Some(if attribute == "id" {
            format!("#{}", escape_identifier(id))
        } else {
            format!("[{}={}]", escape_identifier(attribute), quote_string(id))
        })
    }
}

/// 1-based index of `node` among the element children of `parent`
fn element_position<T>(tree: &T, parent: T::Node, node: T::Node) -> usize
where
    T: TreeShape + ?Sized,
{
    tree.children(parent)
        .iter()
        .filter(|&&child| tree.kind(child) == NodeKind::Element)
        .position(|&child| child == node)
        .map_or(1, |index| index + 1)
}

/// Elements in `node`'s tree whose `attribute` equals `value`, counting
/// stops at two
fn count_carriers<T>(tree: &T, node: T::Node, attribute: &str, value: &str) -> usize
where
    T: TreeShape + ?Sized,
{
    let top = std::iter::successors(Some(node), |&n| tree.parent(n))
        .last()
        .unwrap_or(node);
    let carries = |n: T::Node| tree.attribute(n, attribute) == Some(value);
    let seed = usize::from(carries(top));

    fold_nodes(tree, top, seed, |count, n| {
        let count = count + usize::from(carries(n));
        if count > 1 {
            Step::Stop(count)
        } else {
            Step::Continue(count)
        }
    })
}
