use std::cell::Cell;

use flume::{Receiver, Sender, TryRecvError};
use log::{debug, trace};

use crate::error::{ChildrenError, Result, TreeError};

type Transform<T, F> = Box<dyn Fn(&T, usize) -> F>;
type FlatPredicate<F> = Box<dyn Fn(&F) -> bool>;
type FlatLevel<F> = Box<dyn Fn(&F) -> usize>;
type ChildrenFetch<T> =
    Box<dyn Fn(&T) -> std::result::Result<Children<T>, ChildrenError>>;
type ChildrenResult<T> = std::result::Result<Vec<T>, ChildrenError>;

/// Children of a source node as returned by the flattener's getter.
pub enum Children<T> {
    /// No children; nothing to recurse into.
    None,
    /// Children available right away.
    Ready(Vec<T>),
    /// Children delivered later through a [`ChildrenSender`].
    Deferred(DeferredChildren<T>),
}

impl<T> Children<T> {
    /// Create a deferred children source and its producer half.
    ///
    /// Only the first value sent counts; later sends are rejected.
    pub fn deferred() -> (ChildrenSender<T>, Self) {
        let (sender, receiver) = flume::bounded(1);
        (
            ChildrenSender { sender },
            Self::Deferred(DeferredChildren { receiver }),
        )
    }
}

impl<T> From<Vec<T>> for Children<T> {
    fn from(children: Vec<T>) -> Self {
        Self::Ready(children)
    }
}

impl<T> From<Option<Vec<T>>> for Children<T> {
    fn from(children: Option<Vec<T>>) -> Self {
        children.map_or(Self::None, Self::Ready)
    }
}

/// Receiving half of a deferred children source.
pub struct DeferredChildren<T> {
    receiver: Receiver<ChildrenResult<T>>,
}

/// Producer half of a deferred children source.
#[derive(Clone)]
pub struct ChildrenSender<T> {
    sender: Sender<ChildrenResult<T>>,
}

impl<T> ChildrenSender<T> {
    /// Deliver the children.
    ///
    /// Returns `false` when a value was already delivered or the flattening
    /// pass waiting for it has been dropped.
    pub fn send(&self, children: Vec<T>) -> bool {
        self.sender.try_send(Ok(children)).is_ok()
    }

    /// Fail the flattening pass waiting for these children.
    pub fn fail(&self, error: impl Into<ChildrenError>) -> bool {
        self.sender.try_send(Err(error.into())).is_ok()
    }
}

enum Slot<T, F> {
    Node(F),
    Pending(PendingChildren<T>),
}

struct PendingChildren<T> {
    parent_level: usize,
    receiver: Receiver<ChildrenResult<T>>,
}

/// One flattening pass.
///
/// Holds resolved flat nodes in pre-order plus a placeholder at the position
/// of every deferred children source still waiting for its value.
pub struct Flattening<T, F> {
    generation: u64,
    slots: Vec<Slot<T, F>>,
}

impl<T, F> Flattening<T, F> {
    /// Generation of the flattener pass that produced this value.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolved nodes in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = &F> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Node(node) => Some(node),
            Slot::Pending(_) => None,
        })
    }

    /// Consume the pass, keeping the resolved nodes in pre-order. Pending
    /// slots are dropped, which disconnects their senders.
    pub fn into_nodes(self) -> Vec<F> {
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Node(node) => Some(node),
                Slot::Pending(_) => None,
            })
            .collect()
    }

    /// Number of deferred children sources still waiting for a value.
    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    pub fn is_settled(&self) -> bool {
        self.pending() == 0
    }
}

/// Converts nested source nodes into a flat, depth-tagged sequence and
/// filters such a sequence by expansion state.
pub struct TreeFlattener<T, F> {
    transform: Transform<T, F>,
    level: FlatLevel<F>,
    expandable: FlatPredicate<F>,
    children: ChildrenFetch<T>,
    max_depth: Option<usize>,
    generation: Cell<u64>,
}

impl<T, F> TreeFlattener<T, F> {
    pub fn new<C>(
        transform: impl Fn(&T, usize) -> F + 'static,
        level: impl Fn(&F) -> usize + 'static,
        is_expandable: impl Fn(&F) -> bool + 'static,
        children: impl Fn(&T) -> C + 'static,
    ) -> Self
    where
        C: Into<Children<T>>,
    {
        Self::with_fallible_children(
            transform,
            level,
            is_expandable,
            move |node| Ok(children(node).into()),
        )
    }

    /// Like [`TreeFlattener::new`], for children getters that can fail.
    pub fn with_fallible_children(
        transform: impl Fn(&T, usize) -> F + 'static,
        level: impl Fn(&F) -> usize + 'static,
        is_expandable: impl Fn(&F) -> bool + 'static,
        children: impl Fn(&T) -> std::result::Result<Children<T>, ChildrenError>
        + 'static,
    ) -> Self {
        Self {
            transform: Box::new(transform),
            level: Box::new(level),
            expandable: Box::new(is_expandable),
            children: Box::new(children),
            max_depth: None,
            generation: Cell::new(0),
        }
    }

    /// Reject trees nested deeper than `limit`.
    ///
    /// Without a limit a cyclic children getter recurses until the stack
    /// overflows.
    #[must_use]
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }

    /// Deepest level a pass may reach, if limited.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Level of a flat node as reported by the level getter.
    pub fn level(&self, node: &F) -> usize {
        (self.level)(node)
    }

    /// Whether a flat node can be expanded.
    pub fn is_expandable(&self, node: &F) -> bool {
        (self.expandable)(node)
    }

    /// Generation of the most recent pass started by [`Self::flatten`].
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Start a new flattening pass over `roots`.
    ///
    /// A successful pass makes every earlier pass stale: [`Self::poll`] no
    /// longer resolves its deferred children. A failed pass leaves the
    /// generation untouched, so the previous pass keeps resolving.
    pub fn flatten(&self, roots: &[T]) -> Result<Flattening<T, F>> {
        let generation = self.generation.get().wrapping_add(1);

        let mut slots = Vec::new();
        for root in roots {
            self.flatten_node(root, 0, &mut slots)?;
        }
        self.generation.set(generation);

        let pass = Flattening { generation, slots };
        debug!(
            "flattened {} roots into {} nodes (generation {generation}, {} pending)",
            roots.len(),
            pass.nodes().count(),
            pass.pending()
        );
        Ok(pass)
    }

    /// Flatten `roots`, returning the nodes resolved right away.
    pub fn flatten_nodes(&self, roots: &[T]) -> Result<Vec<F>> {
        self.flatten(roots).map(Flattening::into_nodes)
    }

    /// Splice every deferred children source that delivered its value into
    /// `pass`.
    ///
    /// Returns whether any node was added. Stale passes are left untouched.
    /// A children source that fails aborts the pass with its error; the
    /// caller must discard the pass.
    pub fn poll(&self, pass: &mut Flattening<T, F>) -> Result<bool> {
        if pass.generation != self.generation.get() {
            debug!(
                "ignoring stale flattening pass {} (current {})",
                pass.generation,
                self.generation.get()
            );
            return Ok(false);
        }

        let mut progressed = false;
        let mut index = 0;
        while index < pass.slots.len() {
            let Slot::Pending(pending) = &pass.slots[index] else {
                index += 1;
                continue;
            };
            let parent_level = pending.parent_level;
            match pending.receiver.try_recv() {
                Ok(result) => {
                    let children = result?;
                    let mut resolved = Vec::new();
                    self.flatten_children(
                        &children,
                        parent_level,
                        &mut resolved,
                    )?;
                    trace!(
                        "resolved {} deferred children at level {}",
                        children.len(),
                        parent_level + 1
                    );
                    pass.slots.splice(index..=index, resolved);
                    progressed = true;
                },
                Err(TryRecvError::Empty) => index += 1,
                Err(TryRecvError::Disconnected) => {
                    trace!("deferred children closed without a value");
                    pass.slots.remove(index);
                },
            }
        }
        Ok(progressed)
    }

    /// Keep the nodes whose every ancestor is expanded.
    ///
    /// Single pass with a table indexed by depth: entry `d` holds whether the
    /// most recent expandable node on level `d - 1` is expanded. Roots are
    /// always visible.
    pub fn expand_flattened_nodes(
        &self,
        nodes: &[F],
        is_expanded: impl Fn(&F) -> bool,
    ) -> Vec<F>
    where
        F: Clone,
    {
        expand_flattened(nodes, &self.level, &self.expandable, is_expanded)
            .into_iter()
            .cloned()
            .collect()
    }

    fn flatten_node(
        &self,
        node: &T,
        level: usize,
        slots: &mut Vec<Slot<T, F>>,
    ) -> Result<()> {
        if let Some(limit) = self.max_depth {
            if level > limit {
                return Err(TreeError::DepthExceeded { limit });
            }
        }

        let flat = (self.transform)(node, level);
        let expandable = (self.expandable)(&flat);
        slots.push(Slot::Node(flat));
        if !expandable {
            return Ok(());
        }

        match (self.children)(node)? {
            Children::None => {},
            Children::Ready(children) => {
                self.flatten_children(&children, level, slots)?;
            },
            Children::Deferred(DeferredChildren { receiver }) => {
                match receiver.try_recv() {
                    Ok(result) => {
                        self.flatten_children(&result?, level, slots)?;
                    },
                    Err(TryRecvError::Empty) => {
                        slots.push(Slot::Pending(PendingChildren {
                            parent_level: level,
                            receiver,
                        }));
                    },
                    Err(TryRecvError::Disconnected) => {
                        trace!("deferred children closed without a value");
                    },
                }
            },
        }
        Ok(())
    }

    fn flatten_children(
        &self,
        children: &[T],
        parent_level: usize,
        slots: &mut Vec<Slot<T, F>>,
    ) -> Result<()> {
        for child in children {
            self.flatten_node(child, parent_level + 1, slots)?;
        }
        Ok(())
    }
}

/// Borrowing form of [`TreeFlattener::expand_flattened_nodes`].
pub fn expand_flattened<'a, F>(
    nodes: &'a [F],
    level: impl Fn(&F) -> usize,
    is_expandable: impl Fn(&F) -> bool,
    is_expanded: impl Fn(&F) -> bool,
) -> Vec<&'a F> {
    let mut visible = Vec::new();
    let mut expanded_at = vec![true];

    for node in nodes {
        let node_level = level(node);
        let shown = expanded_at
            .get(..=node_level)
            .is_some_and(|gates| gates.iter().all(|open| *open));
        if shown {
            visible.push(node);
        }

        if is_expandable(node) {
            let child_level = node_level + 1;
            if expanded_at.len() <= child_level {
                expanded_at.resize(child_level + 1, false);
            }
            expanded_at[child_level] = is_expanded(node);
        }
    }
    visible
}
