//! Selector → host range
//!
//! Resolution walks the refinement chain from the outside in. Each
//! `CssSelector` narrows the scope to the first matching descendant; the
//! chain ends in text positions (resolved to anchors by the scanner) or in the
//! matched element itself.

use crate::error::{AnchorError, Result};
use crate::scanner::{anchor_at_offset, anchors_at_offsets};
use crate::selector::{Selector, SelectorKind};
use dom::{Anchor, RangeMaterializer, TreeQuery};

/// Resolve `selector` against the subtree rooted at `target`
pub fn decode_range<T>(tree: &T, selector: &Selector, target: T::Node) -> Result<T::Range>
where
    T: TreeQuery + RangeMaterializer + ?Sized,
{
    let mut current = selector;
    let mut scope = target;

    loop {
        match &current.kind {
            SelectorKind::Css { value } => {
                let matched = query(tree, scope, value)?;
                let Some(refinement) = current.refined_by.as_deref() else {
                    return materialize(tree.select_node(matched));
                };
                match &refinement.kind {
                    SelectorKind::Css { .. } => {
                        scope = matched;
                        current = refinement;
                    }
                    SelectorKind::TextPosition { start, end } => {
                        return resolve_text_position(tree, *start, *end, matched);
                    }
                    SelectorKind::Range {
                        start_selector,
                        end_selector,
                    } => {
                        return resolve_range(tree, start_selector, end_selector, matched);
                    }
                    other => return Err(AnchorError::unsupported(other.tag())),
                }
            }
            SelectorKind::TextPosition { start, end } => {
                ignore_refinement(current);
                return resolve_text_position(tree, *start, *end, scope);
            }
            SelectorKind::Range {
                start_selector,
                end_selector,
            } => {
                ignore_refinement(current);
                return resolve_range(tree, start_selector, end_selector, scope);
            }
            other => return Err(AnchorError::unsupported(other.tag())),
        }
    }
}

/// Resolve a selector chain that bottoms out in a single position
pub fn resolve_marker<T>(tree: &T, selector: &Selector, target: T::Node) -> Result<Anchor<T::Node>>
where
    T: TreeQuery + ?Sized,
{
    let mut current = selector;
    let mut scope = target;

    loop {
        match &current.kind {
            SelectorKind::TextPosition { start, .. } => {
                ignore_refinement(current);
                let offset = to_offset(*start)?;
                return anchor_at_offset(tree, scope, offset)
                    .ok_or_else(|| AnchorError::offset_out_of_range(*start));
            }
            SelectorKind::Css { value } => {
                scope = query(tree, scope, value)?;
                match current.refined_by.as_deref() {
                    Some(refinement) => current = refinement,
                    // An element alone does not mark a position
                    None => return Err(AnchorError::unsupported(current.tag())),
                }
            }
            other => return Err(AnchorError::unsupported(other.tag())),
        }
    }
}

/// Resolve a batch of stored selectors, e.g. when a page loads.
///
/// Failures are logged and returned in place so one stale selector does not
/// hide the others.
pub fn decode_all<T>(tree: &T, selectors: &[Selector], target: T::Node) -> Vec<Result<T::Range>>
where
    T: TreeQuery + RangeMaterializer + ?Sized,
{
    selectors
        .iter()
        .map(|selector| {
            let resolved = decode_range(tree, selector, target);
            if let Err(err) = &resolved {
                tracing::warn!("failed to resolve {}: {}", selector.tag(), err);
            }
            resolved
        })
        .collect()
}

fn query<T>(tree: &T, scope: T::Node, value: &str) -> Result<T::Node>
where
    T: TreeQuery + ?Sized,
{
    tree.query_selector(scope, value)
        .ok_or_else(|| AnchorError::no_match(value))
}

fn resolve_text_position<T>(tree: &T, start: i64, end: i64, scope: T::Node) -> Result<T::Range>
where
    T: TreeQuery + RangeMaterializer + ?Sized,
{
    let from = to_offset(start)?;
    let to = to_offset(end)?;

    let mut anchors = anchors_at_offsets(tree, scope, [from, to]);
    let start_anchor = anchors
        .remove(&from)
        .ok_or_else(|| AnchorError::offset_out_of_range(start))?;
    let end_anchor = match anchors.remove(&to) {
        Some(anchor) => anchor,
        None if to == from => start_anchor,
        None => return Err(AnchorError::offset_out_of_range(end)),
    };
    materialize(tree.create_range(start_anchor, end_anchor))
}

fn resolve_range<T>(tree: &T, start: &Selector, end: &Selector, scope: T::Node) -> Result<T::Range>
where
    T: TreeQuery + RangeMaterializer + ?Sized,
{
    let start_anchor = resolve_marker(tree, start, scope)?;
    let end_anchor = resolve_marker(tree, end, scope)?;
    materialize(tree.create_range(start_anchor, end_anchor))
}

fn to_offset(offset: i64) -> Result<usize> {
    usize::try_from(offset).map_err(|_| AnchorError::offset_out_of_range(offset))
}

fn materialize<R, E>(built: std::result::Result<R, E>) -> Result<R>
where
    E: std::fmt::Display,
{
    built.map_err(|err| AnchorError::RangeConstructionFailed {
        reason: err.to_string(),
    })
}

fn ignore_refinement(selector: &Selector) {
    if let Some(refinement) = &selector.refined_by {
        tracing::debug!(
            "ignoring {} refinement of {}",
            refinement.tag(),
            selector.tag()
        );
    }
}
