use arbor_tree::{AccessorKind, TreeError};
use thiserror::Error;

/// Errors originating from `arbor-source` adapters.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("data source does not support a tree with a {found}")]
    UnsupportedAccessor { found: AccessorKind },
}

pub type Result<T> = std::result::Result<T, SourceError>;
