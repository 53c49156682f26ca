use std::hash::Hash;
use std::sync::Arc;

use crate::accessor::{ExpandableAccessor, LevelAccessor, TrackBy};
use crate::expansion::ExpansionModel;
use crate::traversal::descendant_range;

/// Externally managed controller for flat tree data.
///
/// Owns the flattened nodes, knows their level and expandability, and keeps
/// its own expansion set keyed by `track_by`.
pub struct FlatTreeControl<F, K> {
    data_nodes: Arc<[F]>,
    level: LevelAccessor<F>,
    expandable: ExpandableAccessor<F>,
    track_by: TrackBy<F, K>,
    expansion: ExpansionModel<K>,
}

impl<F, K: Eq + Hash> FlatTreeControl<F, K> {
    pub fn new(
        level: impl Fn(&F) -> usize + 'static,
        is_expandable: impl Fn(&F) -> bool + 'static,
        track_by: impl Fn(&F) -> K + 'static,
    ) -> Self {
        Self {
            data_nodes: Arc::from(Vec::new()),
            level: Box::new(level),
            expandable: Box::new(is_expandable),
            track_by: Box::new(track_by),
            expansion: ExpansionModel::new(),
        }
    }

    pub fn data_nodes(&self) -> &[F] {
        &self.data_nodes
    }

    pub fn shared_data_nodes(&self) -> &Arc<[F]> {
        &self.data_nodes
    }

    /// Replace the flat nodes. The expansion set is left untouched.
    pub fn set_data_nodes(&mut self, nodes: impl Into<Arc<[F]>>) {
        self.data_nodes = nodes.into();
    }

    pub fn level(&self, node: &F) -> usize {
        (self.level)(node)
    }

    pub fn is_expandable(&self, node: &F) -> bool {
        (self.expandable)(node)
    }

    pub fn key(&self, node: &F) -> K {
        (self.track_by)(node)
    }

    pub fn expansion(&self) -> &ExpansionModel<K> {
        &self.expansion
    }

    pub fn is_expanded(&self, node: &F) -> bool {
        self.expansion.is_expanded(&self.key(node))
    }

    pub fn expand(&mut self, node: &F) -> bool {
        let key = self.key(node);
        self.expansion.expand(key)
    }

    pub fn collapse(&mut self, node: &F) -> bool {
        let key = self.key(node);
        self.expansion.collapse(&key)
    }

    pub fn toggle(&mut self, node: &F) -> bool {
        let key = self.key(node);
        self.expansion.toggle(key)
    }

    /// Expand every data node, leaves included.
    pub fn expand_all(&mut self) -> bool {
        let keys: Vec<K> = self
            .data_nodes
            .iter()
            .map(|node| (self.track_by)(node))
            .collect();
        self.expansion.expand_many(keys)
    }

    pub fn collapse_all(&mut self) -> bool {
        self.expansion.clear()
    }

    /// Index of `node` in the data nodes, matched by key.
    pub fn position(&self, node: &F) -> Option<usize> {
        let key = self.key(node);
        self.data_nodes
            .iter()
            .position(|candidate| (self.track_by)(candidate) == key)
    }

    /// Descendants of `node` among the data nodes.
    pub fn descendants(&self, node: &F) -> &[F] {
        match self.position(node) {
            Some(index) => &self.data_nodes
                [descendant_range(&self.data_nodes, index, &self.level)],
            None => &[],
        }
    }

    /// Expand `node` and every descendant of it.
    pub fn expand_descendants(&mut self, node: &F) -> bool {
        let keys = self.subtree_keys(node);
        self.expansion.expand_many(keys)
    }

    pub fn collapse_descendants(&mut self, node: &F) -> bool {
        let keys = self.subtree_keys(node);
        self.expansion.collapse_many(keys)
    }

    pub fn toggle_descendants(&mut self, node: &F) -> bool {
        if self.is_expanded(node) {
            self.collapse_descendants(node)
        } else {
            self.expand_descendants(node)
        }
    }

    fn subtree_keys(&self, node: &F) -> Vec<K> {
        std::iter::once(node)
            .chain(self.descendants(node))
            .map(|node| self.key(node))
            .collect()
    }
}
