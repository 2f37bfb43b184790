//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::{AttributeId, NodeId};

/// Structural violations of the node tree.
///
/// Every variant signals a programming error in tree construction. The
/// operation that raised it left the tree unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node already attached: {0}")]
    NodeAlreadyAttached(NodeId),

    #[error("attribute already attached: {0}")]
    AttributeAlreadyAttached(AttributeId),

    #[error("attribute name must not be empty")]
    EmptyAttributeName,

    #[error("{node} is not a child of {container}")]
    NotAChild { container: NodeId, node: NodeId },

    #[error("container already holds a child: {0}")]
    ChildSlotOccupied(NodeId),

    #[error("node cannot own children: {0}")]
    NotAContainer(NodeId),

    #[error("attaching {0} would make it its own ancestor")]
    CycleDetected(NodeId),

    #[error("node appears twice in one batch: {0}")]
    DuplicateInBatch(NodeId),

    #[error("node does not exist: {0}")]
    UnknownNode(NodeId),

    #[error("attribute does not exist: {0}")]
    UnknownAttribute(AttributeId),

    #[error("node belongs to a different tree: {0}")]
    ForeignNode(NodeId),

    #[error("attribute belongs to a different tree: {0}")]
    ForeignAttribute(AttributeId),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
