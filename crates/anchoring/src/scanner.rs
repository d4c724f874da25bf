//! Preorder text scanning
//!
//! Everything offset-related reduces to one primitive: a depth-first,
//! left-to-right fold over the text leaves below a node that can stop early.
//! The walk keeps its own stack, so pathological nesting costs heap, not
//! call stack.

use dom::{Anchor, BoundaryPoint, NodeKind, TreeShape};
use std::collections::{BTreeMap, BTreeSet};

/// Instruction returned by a fold visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<S> {
    Continue(S),
    Stop(S),
}

/// Fold over every node strictly below `root` in preorder.
///
/// Only elements and documents are descended into.
pub fn fold_nodes<T, S, F>(tree: &T, root: T::Node, seed: S, mut visit: F) -> S
where
    T: TreeShape + ?Sized,
    F: FnMut(S, T::Node) -> Step<S>,
{
    let mut state = seed;
    let mut stack: Vec<T::Node> = tree.children(root).iter().rev().copied().collect();

    while let Some(node) = stack.pop() {
        state = match visit(state, node) {
            Step::Continue(next) => next,
            Step::Stop(done) => return done,
        };
        if tree.kind(node).has_children() {
            stack.extend(tree.children(node).iter().rev().copied());
        }
    }
    state
}

/// Fold over the text leaves below `root` in preorder
pub fn fold_text_leaves<T, S, F>(tree: &T, root: T::Node, seed: S, mut visit: F) -> S
where
    T: TreeShape + ?Sized,
    F: FnMut(S, T::Node) -> Step<S>,
{
    fold_nodes(tree, root, seed, |state, node| {
        if tree.kind(node) == NodeKind::Text {
            visit(state, node)
        } else {
            Step::Continue(state)
        }
    })
}

/// Total text length below `root`
pub fn text_length<T>(tree: &T, root: T::Node) -> usize
where
    T: TreeShape + ?Sized,
{
    if tree.kind(root) == NodeKind::Text {
        return tree.text_len(root);
    }
    fold_text_leaves(tree, root, 0, |total, leaf| {
        Step::Continue(total + tree.text_len(leaf))
    })
}

/// Anchor for the `offset`-th text unit below `root`.
///
/// The anchor lands in the first leaf whose running length exceeds `offset`,
/// so an offset on a leaf boundary belongs to the following leaf. The very end
/// of the text resolves to the end of the last non-empty leaf. `None` past the
/// end.
pub fn anchor_at_offset<T>(tree: &T, root: T::Node, offset: usize) -> Option<Anchor<T::Node>>
where
    T: TreeShape + ?Sized,
{
    anchors_at_offsets(tree, root, [offset]).remove(&offset)
}

struct OffsetScan<N> {
    pending: Vec<usize>,
    found: BTreeMap<usize, Anchor<N>>,
    position: usize,
    last: Option<(N, usize)>,
}

/// Resolve several offsets below `root` in a single pass.
///
/// Offsets that fall outside the text are missing from the result.
pub fn anchors_at_offsets<T, I>(
    tree: &T,
    root: T::Node,
    offsets: I,
) -> BTreeMap<usize, Anchor<T::Node>>
where
    T: TreeShape + ?Sized,
    I: IntoIterator<Item = usize>,
{
    let sorted: BTreeSet<usize> = offsets.into_iter().collect();
    if tree.kind(root) == NodeKind::Text {
        let length = tree.text_len(root);
        return sorted
            .into_iter()
            .filter(|&offset| offset <= length)
            .map(|offset| (offset, Anchor::new(root, offset)))
            .collect();
    }

    // Descending, so the smallest pending offset is popped from the back
    let seed = OffsetScan {
        pending: sorted.into_iter().rev().collect(),
        found: BTreeMap::new(),
        position: 0,
        last: None,
    };

    let mut scan = fold_text_leaves(tree, root, seed, |mut scan, leaf| {
        let length = tree.text_len(leaf);
        let end = scan.position + length;
        while let Some(&offset) = scan.pending.last() {
            if end > offset {
                scan.pending.pop();
                scan.found
                    .insert(offset, Anchor::new(leaf, offset - scan.position));
            } else {
                break;
            }
        }
        if length > 0 {
            scan.last = Some((leaf, length));
        }
        scan.position = end;

        if scan.pending.is_empty() {
            Step::Stop(scan)
        } else {
            Step::Continue(scan)
        }
    });

    // Only the end of the text itself can still be pending and resolvable
    if let (Some(&offset), Some((leaf, length))) = (scan.pending.last(), scan.last) {
        if offset == scan.position {
            scan.found.insert(offset, Anchor::new(leaf, length));
        }
    }
    scan.found
}

/// Text units between the start of `anchor_to` and the boundary point.
///
/// Text containers contribute their local offset; element containers count
/// the text of their first `offset` children. `None` when the point is not
/// inside `anchor_to` or its offset is past the container's length.
pub fn character_offset_of<T>(
    tree: &T,
    point: BoundaryPoint<T::Node>,
    anchor_to: T::Node,
) -> Option<usize>
where
    T: TreeShape + ?Sized,
{
    if !is_inclusive_ancestor(tree, anchor_to, point.container) {
        return None;
    }

    let (stop, extra) = match tree.kind(point.container) {
        NodeKind::Text => {
            if point.offset > tree.text_len(point.container) {
                return None;
            }
            (Some(point.container), point.offset)
        }
        _ => {
            let children = tree.children(point.container);
            if point.offset > children.len() {
                return None;
            }
            match children.get(point.offset) {
                Some(&child) => (Some(child), 0),
                None => (next_outside(tree, point.container, anchor_to), 0),
            }
        }
    };

    if stop == Some(anchor_to) {
        return Some(extra);
    }
    let before = fold_nodes(tree, anchor_to, 0, |total, node| {
        if Some(node) == stop {
            Step::Stop(total)
        } else if tree.kind(node) == NodeKind::Text {
            Step::Continue(total + tree.text_len(node))
        } else {
            Step::Continue(total)
        }
    });
    Some(before + extra)
}

pub(crate) fn is_inclusive_ancestor<T>(tree: &T, ancestor: T::Node, node: T::Node) -> bool
where
    T: TreeShape + ?Sized,
{
    std::iter::successors(Some(node), |&current| tree.parent(current)).any(|n| n == ancestor)
}

/// First node after the subtree of `node` in preorder, staying inside `root`
fn next_outside<T>(tree: &T, node: T::Node, root: T::Node) -> Option<T::Node>
where
    T: TreeShape + ?Sized,
{
    let mut current = node;
    while current != root {
        let parent = tree.parent(current)?;
        let siblings = tree.children(parent);
        let index = siblings.iter().position(|&sibling| sibling == current)?;
        if let Some(&next) = siblings.get(index + 1) {
            return Some(next);
        }
        current = parent;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{DocumentBuilder, DomArena, NodeId};

    /// `<div id="a"><p>Hello <b>world</b></p><!--x--><p></p><p>!</p></div>`
    fn sample() -> DomArena {
        let mut b = DocumentBuilder::new();
        b.open("div")
            .attr("id", "a")
            .open("p")
            .text("Hello ")
            .open("b")
            .text("world")
            .close()
            .close()
            .comment("x")
            .open("p")
            .text("")
            .close()
            .open("p")
            .text("!")
            .close()
            .close();
        b.build()
    }

    fn leaf_texts(arena: &DomArena, root: NodeId) -> Vec<String> {
        fold_text_leaves(arena, root, Vec::new(), |mut acc, leaf| {
            acc.push(arena.get(leaf).unwrap().node_value.clone());
            Step::Continue(acc)
        })
    }

    #[test]
    fn test_fold_visits_text_leaves_in_preorder() {
        let arena = sample();
        let div = arena.find_by_id("a").unwrap();
        assert_eq!(leaf_texts(&arena, div), vec!["Hello ", "world", "", "!"]);
        assert_eq!(text_length(&arena, div), 12);
    }

    #[test]
    fn test_fold_stops_early() {
        let arena = sample();
        let div = arena.find_by_id("a").unwrap();
        let visited = fold_text_leaves(&arena, div, 0, |count, _| Step::Stop(count + 1));
        assert_eq!(visited, 1);

        let bold = arena.find_by_tag("b")[0];
        let leaf = arena.get(bold).unwrap().children_ids[0];
        // A text leaf has no leaves below it
        assert_eq!(fold_text_leaves(&arena, leaf, 7, |n, _| Step::Continue(n + 1)), 7);
    }

    #[test]
    fn test_anchor_at_offset_rebases_to_leaf() {
        let arena = sample();
        let div = arena.find_by_id("a").unwrap();
        let hello = arena.find_text("Hello ").unwrap();
        let world = arena.find_text("world").unwrap();
        let bang = arena.find_text("!").unwrap();

        assert_eq!(anchor_at_offset(&arena, div, 0), Some(Anchor::new(hello, 0)));
        assert_eq!(anchor_at_offset(&arena, div, 5), Some(Anchor::new(hello, 5)));
        // Leaf boundary belongs to the following leaf
        assert_eq!(anchor_at_offset(&arena, div, 6), Some(Anchor::new(world, 0)));
        // The empty paragraph is skipped
        assert_eq!(anchor_at_offset(&arena, div, 11), Some(Anchor::new(bang, 0)));
        assert_eq!(anchor_at_offset(&arena, div, 12), Some(Anchor::new(bang, 1)));
        assert_eq!(anchor_at_offset(&arena, div, 13), None);
    }

    #[test]
    fn test_anchor_at_offset_without_text() {
        let mut b = DocumentBuilder::new();
        b.open("div").open("br").close().close();
        let arena = b.build();
        let div = arena.find_by_tag("div")[0];

        assert_eq!(anchor_at_offset(&arena, div, 0), None);
    }

    #[test]
    fn test_anchor_crossings_are_monotonic() {
        let arena = sample();
        let div = arena.find_by_id("a").unwrap();
        let leaves: Vec<NodeId> = fold_text_leaves(&arena, div, Vec::new(), |mut acc, leaf| {
            acc.push(leaf);
            Step::Continue(acc)
        });

        let mut previous = 0;
        for offset in 0..=text_length(&arena, div) {
            let anchor = anchor_at_offset(&arena, div, offset).unwrap();
            let index = leaves.iter().position(|&leaf| leaf == anchor.node).unwrap();
            assert!(index >= previous, "offset {} went backwards", offset);
            previous = index;
        }
    }

    #[test]
    fn test_anchors_at_offsets_single_pass() {
        let arena = sample();
        let div = arena.find_by_id("a").unwrap();
        let world = arena.find_text("world").unwrap();
        let hello = arena.find_text("Hello ").unwrap();

        let anchors = anchors_at_offsets(&arena, div, [9, 2, 9, 40]);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[&2], Anchor::new(hello, 2));
        assert_eq!(anchors[&9], Anchor::new(world, 3));
        assert!(!anchors.contains_key(&40));
    }

    #[test]
    fn test_anchors_inside_a_text_root() {
        let arena = sample();
        let world = arena.find_text("world").unwrap();
        let anchors = anchors_at_offsets(&arena, world, [0, 5, 6]);
        assert_eq!(anchors.get(&5), Some(&Anchor::new(world, 5)));
        assert!(anchors.get(&6).is_none());
    }

    #[test]
    fn test_character_offset_of_matches_native_offsets() {
        let arena = sample();
        let div = arena.find_by_id("a").unwrap();
        let p = arena.find_by_tag("p")[0];
        let world = arena.find_text("world").unwrap();

        let points = [
            BoundaryPoint::new(div, 0),
            BoundaryPoint::new(div, 1),
            BoundaryPoint::new(div, 4),
            BoundaryPoint::new(p, 1),
            BoundaryPoint::new(p, 2),
            BoundaryPoint::new(world, 3),
        ];
        for point in points {
            assert_eq!(
                character_offset_of(&arena, point, div),
                arena.native_text_offset(div, point),
                "mismatch at {:?}",
                point
            );
        }
        assert_eq!(character_offset_of(&arena, BoundaryPoint::new(world, 3), div), Some(9));
        assert_eq!(character_offset_of(&arena, BoundaryPoint::new(world, 3), p), Some(9));
        assert_eq!(character_offset_of(&arena, BoundaryPoint::new(world, 3), world), Some(3));
    }

    #[test]
    fn test_character_offset_of_rejects_outside_points() {
        let arena = sample();
        let p = arena.find_by_tag("p")[0];
        let bang = arena.find_text("!").unwrap();
        let world = arena.find_text("world").unwrap();

        assert_eq!(character_offset_of(&arena, BoundaryPoint::new(bang, 0), p), None);
        assert_eq!(character_offset_of(&arena, BoundaryPoint::new(world, 6), p), None);
        assert_eq!(character_offset_of(&arena, BoundaryPoint::new(p, 3), p), None);
    }
}
