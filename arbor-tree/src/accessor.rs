use std::fmt;

use crate::control::FlatTreeControl;

/// Returns the depth of a flat node.
pub type LevelAccessor<F> = Box<dyn Fn(&F) -> usize>;
/// Returns the nested children of a node.
pub type ChildrenAccessor<F> = Box<dyn Fn(&F) -> &[F]>;
/// Returns whether a flat node may reveal children.
pub type ExpandableAccessor<F> = Box<dyn Fn(&F) -> bool>;
/// Returns the identity of a node, used as its expansion key.
pub type TrackBy<F, K> = Box<dyn Fn(&F) -> K>;

/// The way a tree discovers the shape of its data.
///
/// Exactly one strategy is active per tree.
pub enum NodeAccessor<F, K> {
    /// Data is already flat; each node reports its own level.
    Level {
        level: LevelAccessor<F>,
        track_by: TrackBy<F, K>,
    },
    /// Data is nested; level is the traversal depth.
    Children {
        children: ChildrenAccessor<F>,
        track_by: TrackBy<F, K>,
    },
    /// A controller owns data nodes, levels and its own expansion state.
    Control(FlatTreeControl<F, K>),
}

impl<F, K> NodeAccessor<F, K> {
    pub fn kind(&self) -> AccessorKind {
        match self {
            Self::Level { .. } => AccessorKind::Level,
            Self::Children { .. } => AccessorKind::Children,
            Self::Control(_) => AccessorKind::Control,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Level,
    Children,
    Control,
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Level => "level accessor",
            Self::Children => "children accessor",
            Self::Control => "tree control",
        };
        f.write_str(name)
    }
}
