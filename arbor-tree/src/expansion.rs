use std::collections::HashSet;
use std::hash::Hash;

/// Set of node keys whose children are revealed.
///
/// Every mutation reports whether the set actually changed, so owners can
/// skip recomputing the visible projection on no-op calls.
#[derive(Debug, Clone)]
pub struct ExpansionModel<K> {
    expanded: HashSet<K>,
}

impl<K> Default for ExpansionModel<K> {
    fn default() -> Self {
        Self {
            expanded: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash> ExpansionModel<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.contains(key)
    }

    pub fn expand(&mut self, key: K) -> bool {
        self.expanded.insert(key)
    }

    pub fn expand_many(&mut self, keys: impl IntoIterator<Item = K>) -> bool {
        keys.into_iter()
            .fold(false, |changed, key| self.expanded.insert(key) || changed)
    }

    pub fn collapse(&mut self, key: &K) -> bool {
        self.expanded.remove(key)
    }

    pub fn collapse_many(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> bool {
        keys.into_iter()
            .fold(false, |changed, key| self.expanded.remove(&key) || changed)
    }

    /// Flip the state of `key`. Always a change.
    pub fn toggle(&mut self, key: K) -> bool {
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
        }
        true
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.expanded.is_empty();
        self.expanded.clear();
        changed
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.expanded.iter()
    }
}
