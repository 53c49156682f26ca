use std::hash::Hash;
use std::sync::Arc;

use arbor_tree::{AccessorKind, TreeView};

use crate::changes::{ChangeBroadcaster, TreeChanges};
use crate::error::{Result, SourceError};
use crate::options::DataSourceOptions;
use crate::viewport::ViewportRange;

/// Publishes the visible nodes of nested data read through a children
/// accessor.
///
/// A node is visible when every ancestor of it is expanded; the data is
/// walked again on every change.
pub struct NestedDataSource<T, K> {
    tree: TreeView<T, K>,
    visible: Arc<[T]>,
    viewport: Option<ViewportRange>,
    changes: ChangeBroadcaster<T>,
}

impl<T: Clone, K: Eq + Hash> NestedDataSource<T, K> {
    pub fn new(
        tree: TreeView<T, K>,
        data: impl Into<Arc<[T]>>,
    ) -> Result<Self> {
        Self::with_options(tree, data, DataSourceOptions::default())
    }

    pub fn with_options(
        tree: TreeView<T, K>,
        data: impl Into<Arc<[T]>>,
        options: DataSourceOptions,
    ) -> Result<Self> {
        if tree.kind() != AccessorKind::Children {
            return Err(SourceError::UnsupportedAccessor {
                found: tree.kind(),
            });
        }

        let mut source = Self {
            tree,
            visible: Arc::from(Vec::new()),
            viewport: None,
            changes: ChangeBroadcaster::new(options.change_capacity),
        };
        source.set_data(data);
        Ok(source)
    }

    /// Replace the root nodes.
    pub fn set_data(&mut self, data: impl Into<Arc<[T]>>) {
        self.tree.set_data_nodes(data);
        self.refresh();
    }

    pub fn data(&self) -> &Arc<[T]> {
        self.tree.shared_data_nodes()
    }

    pub fn visible(&self) -> Arc<[T]> {
        Arc::clone(&self.visible)
    }

    pub fn visible_window(&self) -> &[T] {
        match self.viewport {
            Some(range) => range.window(&self.visible),
            None => &self.visible,
        }
    }

    pub fn tree(&self) -> &TreeView<T, K> {
        &self.tree
    }

    pub fn connect(&mut self) -> TreeChanges<T> {
        self.changes.subscribe(Arc::clone(&self.visible))
    }

    pub fn disconnect(&mut self, changes: TreeChanges<T>) -> bool {
        self.changes.unsubscribe(changes)
    }

    pub fn view_changed(&mut self, range: ViewportRange) {
        self.viewport = Some(range);
        self.refresh();
    }

    pub fn viewport(&self) -> Option<ViewportRange> {
        self.viewport
    }

    pub fn is_expanded(&self, node: &T) -> bool {
        self.tree.is_expanded(node)
    }

    pub fn expand(&mut self, node: &T) -> bool {
        self.update_expansion(|tree| tree.expand(node))
    }

    pub fn collapse(&mut self, node: &T) -> bool {
        self.update_expansion(|tree| tree.collapse(node))
    }

    pub fn toggle(&mut self, node: &T) -> bool {
        self.update_expansion(|tree| tree.toggle(node))
    }

    pub fn expand_all(&mut self) -> bool {
        self.update_expansion(TreeView::expand_all)
    }

    pub fn collapse_all(&mut self) -> bool {
        self.update_expansion(TreeView::collapse_all)
    }

    pub fn expand_descendants(&mut self, node: &T) -> bool {
        self.update_expansion(|tree| tree.expand_descendants(node))
    }

    pub fn collapse_descendants(&mut self, node: &T) -> bool {
        self.update_expansion(|tree| tree.collapse_descendants(node))
    }

    pub fn toggle_descendants(&mut self, node: &T) -> bool {
        self.update_expansion(|tree| tree.toggle_descendants(node))
    }

    fn update_expansion(
        &mut self,
        update: impl FnOnce(&mut TreeView<T, K>) -> bool,
    ) -> bool {
        let changed = update(&mut self.tree);
        if changed {
            self.refresh();
        }
        changed
    }

    fn refresh(&mut self) {
        let mut visible = Vec::new();
        for root in self.tree.data_nodes() {
            push_visible(&self.tree, root, &mut visible);
        }
        self.visible = Arc::from(visible);
        self.changes.publish(&self.visible);
    }
}

fn push_visible<T: Clone, K: Eq + Hash>(
    tree: &TreeView<T, K>,
    node: &T,
    visible: &mut Vec<T>,
) {
    visible.push(node.clone());
    if !tree.is_expanded(node) {
        return;
    }
    for child in tree.children_of(node).unwrap_or_default() {
        push_visible(tree, child, visible);
    }
}
