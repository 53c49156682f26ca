//! Parent, sibling and descendant lookups over both tree representations.
//!
//! Flat functions work on a pre-order sequence plus a level getter. Nested
//! functions work on root nodes plus a children getter. Both describe the
//! same logical tree, so running the flat variants over
//! [`flatten_nested_nodes_with_levels`] answers exactly like the nested ones.
//!
//! Functions that take a `node` instead of an index locate it by reference
//! identity, so the node must be borrowed from the collection being searched.
//! Absent results (roots, last siblings, leaves) are `None` or empty.

use std::ops::Range;
use std::ptr;

/// Pre-order entry of a nested tree together with its depth.
#[derive(Debug)]
pub struct FlattenedNode<'a, T> {
    /// Zero-based tree depth (`0` for root nodes).
    pub depth: usize,
    /// Borrowed source node.
    pub node: &'a T,
}

impl<T> Clone for FlattenedNode<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FlattenedNode<'_, T> {}

pub(crate) fn position_of<T>(nodes: &[T], node: &T) -> Option<usize> {
    nodes.iter().position(|candidate| ptr::eq(candidate, node))
}

/// Index of the nearest earlier node one level up.
pub fn parent_index<F>(
    nodes: &[F],
    index: usize,
    level: impl Fn(&F) -> usize,
) -> Option<usize> {
    let node_level = level(nodes.get(index)?);
    if node_level == 0 {
        return None;
    }

    nodes[..index]
        .iter()
        .rposition(|candidate| level(candidate) + 1 == node_level)
}

pub fn parent<'a, F>(
    nodes: &'a [F],
    node: &F,
    level: impl Fn(&F) -> usize,
) -> Option<&'a F> {
    let index = position_of(nodes, node)?;
    parent_index(nodes, index, level).map(|parent| &nodes[parent])
}

/// Index of the next node on the same level, stopping at the first
/// shallower node.
pub fn next_sibling_index<F>(
    nodes: &[F],
    index: usize,
    level: impl Fn(&F) -> usize,
) -> Option<usize> {
    let node_level = level(nodes.get(index)?);
    scan_next_sibling(nodes, index, node_level, &level)
}

/// Next sibling of `node`.
///
/// The scan starts after `from_index` when given, which lets repeated calls
/// skip re-locating the node.
pub fn next_sibling<'a, F>(
    nodes: &'a [F],
    node: &F,
    level: impl Fn(&F) -> usize,
    from_index: Option<usize>,
) -> Option<&'a F> {
    let from = match from_index {
        Some(index) => index,
        None => position_of(nodes, node)?,
    };
    scan_next_sibling(nodes, from, level(node), &level)
        .map(|sibling| &nodes[sibling])
}

fn scan_next_sibling<F>(
    nodes: &[F],
    from: usize,
    node_level: usize,
    level: &impl Fn(&F) -> usize,
) -> Option<usize> {
    for (index, candidate) in nodes.iter().enumerate().skip(from + 1) {
        let candidate_level = level(candidate);
        if candidate_level == node_level {
            return Some(index);
        }
        if candidate_level < node_level {
            return None;
        }
    }
    None
}

/// Range of the contiguous run of nodes deeper than the node at `index`.
pub fn descendant_range<F>(
    nodes: &[F],
    index: usize,
    level: impl Fn(&F) -> usize,
) -> Range<usize> {
    let Some(node) = nodes.get(index) else {
        return nodes.len()..nodes.len();
    };
    let node_level = level(node);
    let start = index + 1;
    let end = nodes[start..]
        .iter()
        .position(|candidate| level(candidate) <= node_level)
        .map_or(nodes.len(), |offset| start + offset);
    start..end
}

pub fn descendants<'a, F>(
    nodes: &'a [F],
    node: &F,
    level: impl Fn(&F) -> usize,
) -> &'a [F] {
    match position_of(nodes, node) {
        Some(index) => &nodes[descendant_range(nodes, index, level)],
        None => &[],
    }
}

pub fn parent_for_nested_data<'a, T>(
    nodes: &'a [T],
    node: &T,
    children: impl Fn(&'a T) -> &'a [T],
) -> Option<&'a T> {
    find_parent(nodes, node, &children)
}

fn find_parent<'a, T, C>(
    nodes: &'a [T],
    node: &T,
    children: &C,
) -> Option<&'a T>
where
    C: Fn(&'a T) -> &'a [T],
{
    for candidate in nodes {
        let kids = children(candidate);
        if position_of(kids, node).is_some() {
            return Some(candidate);
        }
        if let Some(parent) = find_parent(kids, node, children) {
            return Some(parent);
        }
    }
    None
}

pub fn next_sibling_for_nested_data<'a, T>(
    nodes: &'a [T],
    node: &T,
    children: impl Fn(&'a T) -> &'a [T],
) -> Option<&'a T> {
    let (siblings, index) = find_siblings(nodes, node, &children)?;
    siblings.get(index + 1)
}

fn find_siblings<'a, T, C>(
    nodes: &'a [T],
    node: &T,
    children: &C,
) -> Option<(&'a [T], usize)>
where
    C: Fn(&'a T) -> &'a [T],
{
    if let Some(index) = position_of(nodes, node) {
        return Some((nodes, index));
    }
    nodes
        .iter()
        .find_map(|candidate| find_siblings(children(candidate), node, children))
}

/// All descendants of `node` in pre-order, excluding `node` itself.
pub fn descendants_for_nested_data<'a, T>(
    node: &'a T,
    children: impl Fn(&'a T) -> &'a [T],
) -> Vec<&'a T> {
    let mut entries = Vec::new();
    for child in children(node) {
        push_nested(child, 0, &children, &mut |_, node| entries.push(node));
    }
    entries
}

/// Pre-order flattening of nested data with no expansion filtering.
pub fn flatten_nested_nodes<'a, T>(
    nodes: &'a [T],
    children: impl Fn(&'a T) -> &'a [T],
) -> Vec<&'a T> {
    let mut entries = Vec::new();
    for node in nodes {
        push_nested(node, 0, &children, &mut |_, node| entries.push(node));
    }
    entries
}

/// Pre-order flattening of nested data that keeps each node's depth.
pub fn flatten_nested_nodes_with_levels<'a, T>(
    nodes: &'a [T],
    children: impl Fn(&'a T) -> &'a [T],
) -> Vec<FlattenedNode<'a, T>> {
    let mut entries = Vec::new();
    for node in nodes {
        push_nested(node, 0, &children, &mut |depth, node| {
            entries.push(FlattenedNode { depth, node });
        });
    }
    entries
}

fn push_nested<'a, T, C>(
    node: &'a T,
    depth: usize,
    children: &C,
    visit: &mut impl FnMut(usize, &'a T),
) where
    C: Fn(&'a T) -> &'a [T],
{
    visit(depth, node);
    for child in children(node) {
        push_nested(child, depth + 1, children, visit);
    }
}
