use thiserror::Error;

use crate::core::BlockKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

#[derive(Debug)]
pub struct PathError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate node spec kind: {0}")]
    DuplicateKind(BlockKind),
}

/// Errors from document edits and block commands. A failed edit leaves the
/// document and selection untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The edit would put a callout inside another callout.
    #[error("callouts cannot be nested")]
    StructuralViolation,

    /// `set_callout` was asked to wrap a selection already inside a callout.
    #[error("selection is already inside a callout")]
    AlreadyInCallout,

    /// No ancestor (or node at the given position) of the expected kind.
    #[error("no {kind} found at the selection")]
    NotFound { kind: BlockKind },

    #[error("range {from}..{to} cannot be edited as one piece")]
    InvalidRange { from: usize, to: usize },

    #[error("{0} is not a container block")]
    NotAContainer(BlockKind),

    #[error("{0} does not hold inline text")]
    NotATextBlock(BlockKind),

    /// The registry has no plugin for the block kind.
    #[error("block kind {0} is not registered")]
    UnknownKind(BlockKind),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}
