use std::hash::Hash;
use std::sync::Arc;

use arbor_tree::{AccessorKind, Flattening, TreeFlattener, TreeView};
use log::{debug, warn};

use crate::changes::{ChangeBroadcaster, TreeChanges};
use crate::error::{Result, SourceError};
use crate::options::DataSourceOptions;
use crate::viewport::ViewportRange;

/// Publishes the visible rows of nested source data through a flat tree.
///
/// Source nodes `T` are flattened into `F` rows; the rows become the data
/// nodes of the tree and the expansion state of the tree filters them into
/// the visible sequence. Works with a level accessor or a tree control.
pub struct FlatDataSource<T, F, K> {
    tree: TreeView<F, K>,
    flattener: TreeFlattener<T, F>,
    data: Arc<[T]>,
    pass: Option<Flattening<T, F>>,
    visible: Arc<[F]>,
    viewport: Option<ViewportRange>,
    changes: ChangeBroadcaster<F>,
}

impl<T, F: Clone, K: Eq + Hash> FlatDataSource<T, F, K> {
    /// Flatten `data` with the default options.
    ///
    /// Fails when `tree` reads children directly, since flattened rows carry
    /// their level instead.
    pub fn new(
        tree: TreeView<F, K>,
        flattener: TreeFlattener<T, F>,
        data: impl Into<Arc<[T]>>,
    ) -> Result<Self> {
        Self::with_options(tree, flattener, data, DataSourceOptions::default())
    }

    pub fn with_options(
        tree: TreeView<F, K>,
        flattener: TreeFlattener<T, F>,
        data: impl Into<Arc<[T]>>,
        options: DataSourceOptions,
    ) -> Result<Self> {
        if tree.kind() == AccessorKind::Children {
            return Err(SourceError::UnsupportedAccessor {
                found: tree.kind(),
            });
        }

        let mut source = Self {
            tree,
            flattener,
            data: Arc::from(Vec::new()),
            pass: None,
            visible: Arc::from(Vec::new()),
            viewport: None,
            changes: ChangeBroadcaster::new(options.change_capacity),
        };
        source.set_data(data)?;
        Ok(source)
    }

    /// Replace the source data and flatten it again.
    ///
    /// A pass still waiting for deferred children is superseded; values its
    /// producers send later are discarded. When flattening fails nothing
    /// changes: the previous data, rows, and visible sequence are kept and
    /// their pending children still resolve through [`Self::poll_children`].
    pub fn set_data(&mut self, data: impl Into<Arc<[T]>>) -> Result<()> {
        let data = data.into();
        let pass = match self.flattener.flatten(&data) {
            Ok(pass) => pass,
            Err(err) => {
                warn!("flattening new data failed: {err}");
                return Err(err.into());
            },
        };

        self.data = data;
        self.tree.set_data_nodes(pass.nodes().cloned().collect::<Vec<_>>());
        self.pass = (!pass.is_settled()).then_some(pass);
        self.refresh();
        Ok(())
    }

    /// The source data last passed to [`Self::set_data`].
    pub fn data(&self) -> &Arc<[T]> {
        &self.data
    }

    /// Every flattened row, collapsed subtrees included.
    pub fn flattened_data(&self) -> &[F] {
        self.tree.data_nodes()
    }

    pub fn visible(&self) -> Arc<[F]> {
        Arc::clone(&self.visible)
    }

    /// Visible rows inside the last reported viewport, or all of them when
    /// none was reported.
    pub fn visible_window(&self) -> &[F] {
        match self.viewport {
            Some(range) => range.window(&self.visible),
            None => &self.visible,
        }
    }

    pub fn tree(&self) -> &TreeView<F, K> {
        &self.tree
    }

    pub fn flattener(&self) -> &TreeFlattener<T, F> {
        &self.flattener
    }

    /// Generation of the last successful flattening pass.
    pub fn generation(&self) -> u64 {
        self.flattener.generation()
    }

    pub fn has_pending_children(&self) -> bool {
        self.pass.as_ref().is_some_and(|pass| !pass.is_settled())
    }

    /// Resolve deferred children that delivered their value.
    ///
    /// Returns whether rows were added. A failing children source discards
    /// the whole pass: the rows and the visible sequence become empty,
    /// subscribers are notified once and the error is returned.
    pub fn poll_children(&mut self) -> Result<bool> {
        let Some(pass) = self.pass.as_mut() else {
            return Ok(false);
        };

        let progressed = match self.flattener.poll(pass) {
            Ok(progressed) => progressed,
            Err(err) => {
                warn!("deferred children failed, discarding pass: {err}");
                self.pass = None;
                self.tree.set_data_nodes(Vec::new());
                self.refresh();
                return Err(err.into());
            },
        };

        if progressed {
            let nodes: Vec<F> = pass.nodes().cloned().collect();
            self.tree.set_data_nodes(nodes);
        }
        if pass.is_settled() {
            debug!("flattening pass {} settled", pass.generation());
            self.pass = None;
        }
        if progressed {
            self.refresh();
        }
        Ok(progressed)
    }

    /// Subscribe to the visible sequence.
    pub fn connect(&mut self) -> TreeChanges<F> {
        self.changes.subscribe(Arc::clone(&self.visible))
    }

    /// Release a subscription returned by [`Self::connect`].
    pub fn disconnect(&mut self, changes: TreeChanges<F>) -> bool {
        self.changes.unsubscribe(changes)
    }

    /// Viewer reports a new viewport or a structural change.
    pub fn view_changed(&mut self, range: ViewportRange) {
        self.viewport = Some(range);
        self.refresh();
    }

    pub fn viewport(&self) -> Option<ViewportRange> {
        self.viewport
    }

    pub fn is_expanded(&self, node: &F) -> bool {
        self.tree.is_expanded(node)
    }

    pub fn expand(&mut self, node: &F) -> bool {
        self.update_expansion(|tree| tree.expand(node))
    }

    pub fn collapse(&mut self, node: &F) -> bool {
        self.update_expansion(|tree| tree.collapse(node))
    }

    pub fn toggle(&mut self, node: &F) -> bool {
        self.update_expansion(|tree| tree.toggle(node))
    }

    pub fn expand_all(&mut self) -> bool {
        self.update_expansion(TreeView::expand_all)
    }

    pub fn collapse_all(&mut self) -> bool {
        self.update_expansion(TreeView::collapse_all)
    }

    pub fn expand_descendants(&mut self, node: &F) -> bool {
        self.update_expansion(|tree| tree.expand_descendants(node))
    }

    pub fn collapse_descendants(&mut self, node: &F) -> bool {
        self.update_expansion(|tree| tree.collapse_descendants(node))
    }

    pub fn toggle_descendants(&mut self, node: &F) -> bool {
        self.update_expansion(|tree| tree.toggle_descendants(node))
    }

    fn update_expansion(
        &mut self,
        update: impl FnOnce(&mut TreeView<F, K>) -> bool,
    ) -> bool {
        let changed = update(&mut self.tree);
        if changed {
            self.refresh();
        }
        changed
    }

    fn refresh(&mut self) {
        let visible = self
            .flattener
            .expand_flattened_nodes(self.tree.data_nodes(), |node| {
                self.tree.is_expanded(node)
            });
        self.visible = Arc::from(visible);
        self.changes.publish(&self.visible);
    }
}
