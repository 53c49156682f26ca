//! Tree model for list-based tree viewers.
//!
//! A tree is rendered as a flat list of rows. This crate provides the pieces
//! that turn hierarchical data into such a list and keep track of which rows
//! are visible:
//! - [`TreeFlattener`] converts nested source nodes into a pre-order, depth
//!   tagged sequence, resolving children that arrive later through
//!   [`Children::deferred`], and filters that sequence by expansion state.
//! - [`TreeView`] holds one of the three node access strategies (level
//!   accessor, children accessor or [`FlatTreeControl`]) together with the
//!   data nodes and an [`ExpansionModel`].
//! - [`traversal`] and [`indent`] answer parent, sibling, descendant and
//!   indentation questions over both flat and nested data.
//!
//! ```
//! use arbor_tree::TreeFlattener;
//!
//! #[derive(Clone)]
//! struct Entry {
//!     name: &'static str,
//!     children: Vec<Entry>,
//! }
//!
//! #[derive(Clone)]
//! struct Row {
//!     name: &'static str,
//!     level: usize,
//!     expandable: bool,
//! }
//!
//! let flattener = TreeFlattener::new(
//!     |entry: &Entry, level| Row {
//!         name: entry.name,
//!         level,
//!         expandable: !entry.children.is_empty(),
//!     },
//!     |row: &Row| row.level,
//!     |row: &Row| row.expandable,
//!     |entry: &Entry| entry.children.clone(),
//! );
//!
//! let roots = vec![Entry {
//!     name: "src",
//!     children: vec![Entry { name: "lib.rs", children: Vec::new() }],
//! }];
//! let rows = flattener.flatten_nodes(&roots)?;
//! assert_eq!(rows.len(), 2);
//!
//! let visible = flattener.expand_flattened_nodes(&rows, |_| false);
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].name, "src");
//! # Ok::<(), arbor_tree::TreeError>(())
//! ```

mod accessor;
mod control;
mod error;
mod expansion;
mod flattener;
pub mod indent;
pub mod traversal;
mod view;

pub use accessor::{
    AccessorKind, ChildrenAccessor, ExpandableAccessor, LevelAccessor,
    NodeAccessor, TrackBy,
};
pub use control::FlatTreeControl;
pub use error::{ChildrenError, ConfigError, Result, TreeError};
pub use expansion::ExpansionModel;
pub use flattener::{
    Children, ChildrenSender, DeferredChildren, Flattening, TreeFlattener,
    expand_flattened,
};
pub use traversal::FlattenedNode;
pub use view::{TreeView, TreeViewBuilder};
