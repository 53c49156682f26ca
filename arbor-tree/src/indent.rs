//! Indentation guides for tree rows.
//!
//! An indent list holds one entry per ancestor, root first. An entry is
//! `true` when that ancestor has a next sibling, i.e. a guide line keeps
//! running down past the row.

use crate::traversal::{
    next_sibling_for_nested_data, next_sibling_index, parent_for_nested_data,
    parent_index,
};

pub fn indents_for_flat_data<F>(
    nodes: &[F],
    index: usize,
    level: impl Fn(&F) -> usize,
) -> Vec<bool> {
    let mut indents = Vec::new();
    let mut parent = parent_index(nodes, index, &level);
    while let Some(current) = parent {
        indents.push(next_sibling_index(nodes, current, &level).is_some());
        parent = parent_index(nodes, current, &level);
    }
    indents.reverse();
    indents
}

pub fn indents_for_nested_data<'a, T>(
    nodes: &'a [T],
    node: &T,
    children: impl Fn(&'a T) -> &'a [T],
) -> Vec<bool> {
    let mut indents = Vec::new();
    let mut parent = parent_for_nested_data(nodes, node, &children);
    while let Some(current) = parent {
        indents.push(
            next_sibling_for_nested_data(nodes, current, &children).is_some(),
        );
        parent = parent_for_nested_data(nodes, current, &children);
    }
    indents.reverse();
    indents
}

/// Whether the node at `index` is the last of its siblings.
pub fn is_last_flat<F>(
    nodes: &[F],
    index: usize,
    level: impl Fn(&F) -> usize,
) -> bool {
    next_sibling_index(nodes, index, level).is_none()
}

pub fn is_last_nested<'a, T>(
    nodes: &'a [T],
    node: &T,
    children: impl Fn(&'a T) -> &'a [T],
) -> bool {
    next_sibling_for_nested_data(nodes, node, children).is_none()
}
