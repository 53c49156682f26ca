//! Data source adapters for list-based tree viewers.
//!
//! An adapter owns a [`arbor_tree::TreeView`] and the source data, keeps the
//! visible sequence up to date as data and expansion state change, and
//! pushes every new visible sequence to its subscribers:
//! - [`FlatDataSource`] flattens nested source nodes with a
//!   [`arbor_tree::TreeFlattener`] and serves trees with a level accessor or
//!   a flat tree control. Deferred children are resolved with
//!   [`FlatDataSource::poll_children`].
//! - [`NestedDataSource`] serves trees with a children accessor by walking
//!   the expanded part of the nested data.
//!
//! Subscribers obtain a [`TreeChanges`] stream from `connect()`; its first
//! value is the current visible sequence.

mod changes;
mod error;
mod flat;
mod nested;
mod options;
mod viewport;

pub use changes::{
    ChangeRecvError, ChangeRecvResult, ChangeTryRecvError, ChangeTryRecvResult,
    TreeChanges,
};
pub use error::{Result, SourceError};
pub use flat::FlatDataSource;
pub use nested::NestedDataSource;
pub use options::DataSourceOptions;
pub use viewport::ViewportRange;
