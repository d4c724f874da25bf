//! Selection → Selector
//!
//! Offsets are taken relative to the lowest element containing both ends of
//! the selection. When that element is the document root the result is a
//! bare `RangeSelector` of two cursors; otherwise the element is addressed by
//! a CSS path and the cursors refine it, which keeps offsets small and makes
//! the selector immune to edits elsewhere in the document.

use crate::config::CodecConfig;
use crate::error::{AnchorError, Result};
use crate::path::PathBuilder;
use crate::scanner::{character_offset_of, is_inclusive_ancestor};
use crate::selector::Selector;
use dom::{BoundaryPoint, NodeKind, RangeMaterializer, TreeQuery, TreeShape};

/// A live selection range as the codec sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange<N> {
    pub start: BoundaryPoint<N>,
    pub end: BoundaryPoint<N>,
    /// `Range.commonAncestorContainer`; `None` means the whole document
    pub common_ancestor: Option<N>,
}

impl<N: Copy + PartialEq> SelectionRange<N> {
    pub fn new(start: BoundaryPoint<N>, end: BoundaryPoint<N>, common_ancestor: Option<N>) -> Self {
        Self {
            start,
            end,
            common_ancestor,
        }
    }

    /// Read boundaries and common ancestor off a host range
    pub fn from_host<T>(tree: &T, range: &T::Range) -> Self
    where
        T: RangeMaterializer<Node = N> + ?Sized,
    {
        let (start, end) = tree.bounds(range);
        Self::new(start, end, tree.common_ancestor(range))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Encodes selections into selectors
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    paths: PathBuilder,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            paths: PathBuilder::with_config(config),
        }
    }

    pub fn paths(&self) -> &PathBuilder {
        &self.paths
    }

    /// Describe `range` relative to `document_root`.
    ///
    /// The CSS path is only used when querying it from `document_root` finds
    /// the anchor element again; otherwise the offsets fall back to the
    /// document root.
    pub fn encode_range<T>(
        &self,
        tree: &T,
        range: &SelectionRange<T::Node>,
        document_root: T::Node,
    ) -> Result<Selector>
    where
        T: TreeQuery + ?Sized,
    {
        let anchor_to = anchor_element(tree, range.common_ancestor).unwrap_or(document_root);
        if anchor_to == document_root {
            return text_range(tree, range, document_root);
        }

        let refinement = text_range(tree, range, anchor_to)?;
        let path = self.paths.path_of(tree, anchor_to, Some(document_root));
        if tree.query_selector(document_root, &path) != Some(anchor_to) {
            tracing::debug!(
                "'{}' does not resolve back to {:?}, anchoring to the document root",
                path,
                anchor_to
            );
            return text_range(tree, range, document_root);
        }

        tracing::debug!("encoded selection against '{}'", path);
        Ok(Selector::css(path).refined_by(refinement))
    }

    /// Encode a host-native range
    pub fn encode_host_range<T>(
        &self,
        tree: &T,
        range: &T::Range,
        document_root: T::Node,
    ) -> Result<Selector>
    where
        T: TreeQuery + RangeMaterializer + ?Sized,
    {
        self.encode_range(tree, &SelectionRange::from_host(tree, range), document_root)
    }

    /// Encode every non-collapsed range of a multi-range selection, in order
    pub fn encode_selection<T, I>(
        &self,
        tree: &T,
        ranges: I,
        document_root: T::Node,
    ) -> Result<Vec<Selector>>
    where
        T: TreeQuery + ?Sized,
        I: IntoIterator<Item = SelectionRange<T::Node>>,
    {
        ranges
            .into_iter()
            .filter(|range| !range.is_collapsed())
            .map(|range| self.encode_range(tree, &range, document_root))
            .collect()
    }

    /// Selector for a single element, e.g. the element under the pointer
    pub fn target_selector<T>(&self, tree: &T, element: T::Node) -> Selector
    where
        T: TreeShape + ?Sized,
    {
        self.paths.target_selector(tree, element)
    }
}

/// Element the offsets are relative to: text ancestors are replaced by their
/// parent element, documents by `None`
fn anchor_element<T>(tree: &T, common_ancestor: Option<T::Node>) -> Option<T::Node>
where
    T: TreeShape + ?Sized,
{
    let node = common_ancestor?;
    match tree.kind(node) {
        NodeKind::Element => Some(node),
        NodeKind::Text => tree.parent_element(node),
        NodeKind::Document | NodeKind::Other => None,
    }
}

/// `RangeSelector` of two cursors counted from the start of `anchor_to`
fn text_range<T>(tree: &T, range: &SelectionRange<T::Node>, anchor_to: T::Node) -> Result<Selector>
where
    T: TreeShape + ?Sized,
{
    let start = offset_of(tree, range.start, anchor_to)?;
    let end = offset_of(tree, range.end, anchor_to)?;
    if start > end {
        return Err(AnchorError::InvalidBoundary {
            reason: format!("selection end {} precedes start {}", end, start),
        });
    }

    tracing::debug!("selection covers {}..{} of {:?}", start, end, anchor_to);
    Ok(Selector::range(Selector::cursor(start), Selector::cursor(end)))
}

fn offset_of<T>(tree: &T, point: BoundaryPoint<T::Node>, anchor_to: T::Node) -> Result<i64>
where
    T: TreeShape + ?Sized,
{
    if !is_inclusive_ancestor(tree, anchor_to, point.container) {
        return Err(AnchorError::InvalidBoundary {
            reason: format!("{:?} is not inside {:?}", point.container, anchor_to),
        });
    }

    let offset = tree
        .native_text_offset(anchor_to, point)
        .or_else(|| character_offset_of(tree, point, anchor_to))
        .ok_or_else(|| AnchorError::offset_out_of_range(point.offset))?;
    i64::try_from(offset).map_err(|_| AnchorError::offset_out_of_range(offset))
}
