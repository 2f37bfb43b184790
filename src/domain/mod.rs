//! Domain layer: the generic tagged-node tree
//!
//! This layer is independent of JSON:API concerns (no wire records, no service model).

pub mod arena;
pub mod attribute;
pub mod error;
pub mod traversal;
pub mod tree_traits;
pub mod visitor;

pub use arena::{AttributeId, NodeId, NodeRef, NodeShape, Tree, TreeId};
pub use attribute::{AttributeChain, AttributeRef, AttributeValue};
pub use error::{TreeError, TreeResult};
pub use traversal::{Ancestors, Children, Descendants};
pub use tree_traits::TreeNodeConvert;
pub use visitor::{NodeVisitor, VisitResult};
