use bstr::BString;
use thiserror::Error;

use crate::{
    handle::{Handle, NodeId},
    pathhandlegraph::{OccurrenceHandle, PathId},
};

pub type Result<T> = std::result::Result<T, GraphError>;

/// Broad classes of failure, for callers that only care about how to
/// react to an error rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller asked for something the graph cannot do in its
    /// current state. Nothing was modified.
    Precondition,
    /// A node or path lookup missed.
    NotFound,
    /// The graph's indices disagree with each other. Not recoverable.
    Invariant,
    /// Reading or writing a serialized graph failed.
    Io,
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("node {0} already exists")]
    NodeExists(NodeId),
    #[error("node ids must be between 1 and 2^64 - 3")]
    InvalidNodeId,
    #[error("no node IDs are left to assign")]
    NodeIdsExhausted,
    #[error("node sequences cannot be empty")]
    EmptySequence,
    #[error("handle {0:?} does not refer to a node in this graph")]
    InvalidHandle(Handle),
    #[error("cannot divide a node of length {length} at {offsets:?}")]
    InvalidOffsets { offsets: Vec<usize>, length: usize },
    #[error("handle {0:?} is not on the edge")]
    NotOnEdge(Handle),
    #[error("the distance between nodes {0} and {1} cannot be encoded")]
    EdgeDeltaOverflow(NodeId, NodeId),

    #[error("path {0} does not exist")]
    PathNotFound(PathId),
    #[error("no path is named {0}")]
    PathNameNotFound(BString),
    #[error("a path named {0} already exists")]
    PathExists(BString),
    #[error("path {0} has no occurrences")]
    EmptyPath(PathId),
    #[error("occurrence {0:?} does not exist")]
    InvalidOccurrence(OccurrenceHandle),
    #[error("occurrences are not adjacent in path {0}")]
    NotAdjacent(PathId),

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("input is not a serialized graph")]
    BadMagic,
    #[error("format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("corrupt graph: {0}")]
    Corrupt(String),

    #[error("graph invariant violated: {0}")]
    Invariant(String),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        use GraphError::*;
        match self {
            NodeNotFound(_) | PathNotFound(_) | PathNameNotFound(_) => {
                ErrorKind::NotFound
            }
            Io(_) | Serialization(_) | BadMagic | VersionMismatch { .. } => {
                ErrorKind::Io
            }
            Corrupt(_) | Invariant(_) => ErrorKind::Invariant,
            _ => ErrorKind::Precondition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(
            GraphError::NodeNotFound(NodeId(4)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(GraphError::EmptySequence.kind(), ErrorKind::Precondition);
        assert_eq!(GraphError::BadMagic.kind(), ErrorKind::Io);
        assert_eq!(
            GraphError::Invariant("x".into()).kind(),
            ErrorKind::Invariant
        );

        let err = GraphError::PathExists(BString::from("x"));
        assert_eq!(err.to_string(), "a path named x already exists");
    }
}
