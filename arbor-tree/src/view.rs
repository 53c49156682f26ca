use std::hash::Hash;
use std::sync::Arc;

use log::trace;

use crate::accessor::{
    AccessorKind, ChildrenAccessor, LevelAccessor, NodeAccessor, TrackBy,
};
use crate::control::FlatTreeControl;
use crate::error::ConfigError;
use crate::expansion::ExpansionModel;
use crate::indent::{
    indents_for_flat_data, indents_for_nested_data, is_last_flat,
    is_last_nested,
};
use crate::traversal::{
    descendant_range, descendants_for_nested_data, flatten_nested_nodes,
};

/// Collects the node accessor of a [`TreeView`].
///
/// Exactly one of [`Self::level_accessor`], [`Self::children_accessor`] and
/// [`Self::tree_control`] must be called; [`Self::build`] reports anything
/// else as a [`ConfigError`].
pub struct TreeViewBuilder<F, K> {
    level: Option<LevelAccessor<F>>,
    children: Option<ChildrenAccessor<F>>,
    control: Option<FlatTreeControl<F, K>>,
    track_by: Option<TrackBy<F, K>>,
}

impl<F, K> Default for TreeViewBuilder<F, K> {
    fn default() -> Self {
        Self {
            level: None,
            children: None,
            control: None,
            track_by: None,
        }
    }
}

impl<F, K: Eq + Hash> TreeViewBuilder<F, K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat data; each node reports its own level.
    #[must_use]
    pub fn level_accessor(
        mut self,
        level: impl Fn(&F) -> usize + 'static,
    ) -> Self {
        self.level = Some(Box::new(level));
        self
    }

    /// Nested data; each node lists its children.
    #[must_use]
    pub fn children_accessor(
        mut self,
        children: impl Fn(&F) -> &[F] + 'static,
    ) -> Self {
        self.children = Some(Box::new(children));
        self
    }

    /// Flat data driven by an external controller.
    #[must_use]
    pub fn tree_control(mut self, control: FlatTreeControl<F, K>) -> Self {
        self.control = Some(control);
        self
    }

    /// Node identity used as the expansion key.
    #[must_use]
    pub fn track_by(mut self, track_by: impl Fn(&F) -> K + 'static) -> Self {
        self.track_by = Some(Box::new(track_by));
        self
    }

    pub fn build(self) -> Result<TreeView<F, K>, ConfigError> {
        let Self {
            level,
            children,
            control,
            track_by,
        } = self;

        let configured = usize::from(level.is_some())
            + usize::from(children.is_some())
            + usize::from(control.is_some());
        if configured > 1 {
            return Err(ConfigError::MultipleAccessors);
        }

        let accessor = match (level, children, control, track_by) {
            (Some(level), None, None, Some(track_by)) => {
                NodeAccessor::Level { level, track_by }
            },
            (None, Some(children), None, Some(track_by)) => {
                NodeAccessor::Children { children, track_by }
            },
            (None, None, Some(control), None) => NodeAccessor::Control(control),
            (None, None, Some(_), Some(_)) => {
                return Err(ConfigError::ConflictingTrackBy);
            },
            (None, None, None, _) => return Err(ConfigError::MissingAccessor),
            _ => return Err(ConfigError::MissingTrackBy),
        };

        Ok(TreeView {
            accessor,
            expansion: ExpansionModel::new(),
            data_nodes: Arc::from(Vec::new()),
        })
    }
}

/// A tree instance: the active node accessor, the data nodes it reads and
/// the expansion state.
///
/// With a tree control the control owns both the data nodes and the
/// expansion state; the view forwards to it.
pub struct TreeView<F, K> {
    accessor: NodeAccessor<F, K>,
    expansion: ExpansionModel<K>,
    data_nodes: Arc<[F]>,
}

impl<F, K: Eq + Hash> TreeView<F, K> {
    pub fn builder() -> TreeViewBuilder<F, K> {
        TreeViewBuilder::new()
    }

    pub fn kind(&self) -> AccessorKind {
        self.accessor.kind()
    }

    pub fn accessor(&self) -> &NodeAccessor<F, K> {
        &self.accessor
    }

    pub fn control(&self) -> Option<&FlatTreeControl<F, K>> {
        match &self.accessor {
            NodeAccessor::Control(control) => Some(control),
            _ => None,
        }
    }

    /// Flat nodes for level accessors and tree controls, root nodes for
    /// children accessors.
    pub fn data_nodes(&self) -> &[F] {
        self.shared_data_nodes()
    }

    pub fn shared_data_nodes(&self) -> &Arc<[F]> {
        match &self.accessor {
            NodeAccessor::Control(control) => control.shared_data_nodes(),
            _ => &self.data_nodes,
        }
    }

    pub fn set_data_nodes(&mut self, nodes: impl Into<Arc<[F]>>) {
        let nodes = nodes.into();
        trace!("tree data nodes replaced ({} nodes)", nodes.len());
        match &mut self.accessor {
            NodeAccessor::Control(control) => control.set_data_nodes(nodes),
            _ => self.data_nodes = nodes,
        }
    }

    pub fn key(&self, node: &F) -> K {
        match &self.accessor {
            NodeAccessor::Level { track_by, .. }
            | NodeAccessor::Children { track_by, .. } => track_by(node),
            NodeAccessor::Control(control) => control.key(node),
        }
    }

    /// Level of a flat node; `None` for children accessors, where the level
    /// is a property of the position in the tree.
    pub fn level_of(&self, node: &F) -> Option<usize> {
        match &self.accessor {
            NodeAccessor::Level { level, .. } => Some(level(node)),
            NodeAccessor::Control(control) => Some(control.level(node)),
            NodeAccessor::Children { .. } => None,
        }
    }

    /// Children of a nested node; `None` for flat strategies.
    pub fn children_of<'a>(&self, node: &'a F) -> Option<&'a [F]> {
        match &self.accessor {
            NodeAccessor::Children { children, .. } => Some(children(node)),
            _ => None,
        }
    }

    pub fn expansion(&self) -> &ExpansionModel<K> {
        match &self.accessor {
            NodeAccessor::Control(control) => control.expansion(),
            _ => &self.expansion,
        }
    }

    pub fn is_expanded(&self, node: &F) -> bool {
        self.expansion().is_expanded(&self.key(node))
    }

    pub fn expand(&mut self, node: &F) -> bool {
        if let NodeAccessor::Control(control) = &mut self.accessor {
            return control.expand(node);
        }
        let key = self.key(node);
        self.expansion.expand(key)
    }

    pub fn collapse(&mut self, node: &F) -> bool {
        if let NodeAccessor::Control(control) = &mut self.accessor {
            return control.collapse(node);
        }
        let key = self.key(node);
        self.expansion.collapse(&key)
    }

    pub fn toggle(&mut self, node: &F) -> bool {
        if let NodeAccessor::Control(control) = &mut self.accessor {
            return control.toggle(node);
        }
        let key = self.key(node);
        self.expansion.toggle(key)
    }

    /// Expand every node of the tree.
    pub fn expand_all(&mut self) -> bool {
        if let NodeAccessor::Control(control) = &mut self.accessor {
            return control.expand_all();
        }
        let keys: Vec<K> = match &self.accessor {
            NodeAccessor::Children { children, .. } => {
                flatten_nested_nodes(&self.data_nodes, |node| children(node))
                    .into_iter()
                    .map(|node| self.key(node))
                    .collect()
            },
            _ => self.data_nodes.iter().map(|node| self.key(node)).collect(),
        };
        self.expansion.expand_many(keys)
    }

    pub fn collapse_all(&mut self) -> bool {
        match &mut self.accessor {
            NodeAccessor::Control(control) => control.collapse_all(),
            _ => self.expansion.clear(),
        }
    }

    /// Descendants of `node`, in pre-order.
    pub fn descendants<'a>(&'a self, node: &'a F) -> Vec<&'a F> {
        match &self.accessor {
            NodeAccessor::Control(control) => {
                control.descendants(node).iter().collect()
            },
            NodeAccessor::Level { level, .. } => self
                .position(node)
                .map(|index| {
                    let range = descendant_range(&self.data_nodes, index, level);
                    self.data_nodes[range].iter().collect()
                })
                .unwrap_or_default(),
            NodeAccessor::Children { children, .. } => {
                descendants_for_nested_data(node, |node| children(node))
            },
        }
    }

    /// Expand `node` and every descendant of it.
    pub fn expand_descendants(&mut self, node: &F) -> bool {
        if let NodeAccessor::Control(control) = &mut self.accessor {
            return control.expand_descendants(node);
        }
        let keys = self.subtree_keys(node);
        self.expansion.expand_many(keys)
    }

    pub fn collapse_descendants(&mut self, node: &F) -> bool {
        if let NodeAccessor::Control(control) = &mut self.accessor {
            return control.collapse_descendants(node);
        }
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

    /// Indentation guides of `node`, see [`crate::indent`].
    pub fn indents(&self, node: &F) -> Vec<bool> {
        match &self.accessor {
            NodeAccessor::Children { children, .. } => self
                .find_nested(children, node)
                .map(|found| {
                    indents_for_nested_data(&self.data_nodes, found, |node| {
                        children(node)
                    })
                })
                .unwrap_or_default(),
            _ => self
                .position(node)
                .map(|index| {
                    indents_for_flat_data(self.data_nodes(), index, |node| {
                        self.flat_level(node)
                    })
                })
                .unwrap_or_default(),
        }
    }

    /// Whether `node` is the last of its siblings.
    pub fn is_last(&self, node: &F) -> bool {
        match &self.accessor {
            NodeAccessor::Children { children, .. } => {
                self.find_nested(children, node).is_none_or(|found| {
                    is_last_nested(&self.data_nodes, found, |node| {
                        children(node)
                    })
                })
            },
            _ => self.position(node).is_none_or(|index| {
                is_last_flat(self.data_nodes(), index, |node| {
                    self.flat_level(node)
                })
            }),
        }
    }

    /// Index of `node` among the flat data nodes, matched by key.
    pub fn position(&self, node: &F) -> Option<usize> {
        let key = self.key(node);
        self.data_nodes()
            .iter()
            .position(|candidate| self.key(candidate) == key)
    }

    fn flat_level(&self, node: &F) -> usize {
        self.level_of(node).unwrap_or_default()
    }

    /// The data node sharing the key of `node`, found anywhere in the
    /// nested data.
    fn find_nested<'a>(
        &'a self,
        children: &ChildrenAccessor<F>,
        node: &F,
    ) -> Option<&'a F> {
        let key = self.key(node);
        flatten_nested_nodes(&self.data_nodes, |node| children(node))
            .into_iter()
            .find(|candidate| self.key(candidate) == key)
    }

    fn subtree_keys(&self, node: &F) -> Vec<K> {
        std::iter::once(node)
            .chain(self.descendants(node))
            .map(|node| self.key(node))
            .collect()
    }
}
