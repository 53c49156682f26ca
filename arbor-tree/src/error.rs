use thiserror::Error;

/// Misconfigured tree instance, reported by [`TreeViewBuilder::build`].
///
/// [`TreeViewBuilder::build`]: crate::TreeViewBuilder::build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "only one of level accessor, children accessor or tree control may be set"
    )]
    MultipleAccessors,

    #[error("no level accessor, children accessor or tree control was set")]
    MissingAccessor,

    #[error("level and children accessors need a track_by function")]
    MissingTrackBy,

    #[error("a tree control brings its own track_by function")]
    ConflictingTrackBy,
}

/// Failure reported by a node's children source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("children source failed: {message}")]
pub struct ChildrenError {
    message: String,
}

impl ChildrenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ChildrenError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ChildrenError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Errors originating from `arbor-tree`.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid tree configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("flattening aborted: {0}")]
    Children(#[from] ChildrenError),

    #[error("tree is nested deeper than the limit of {limit} levels")]
    DepthExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, TreeError>;
