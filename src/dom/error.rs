//! Document-level errors (wraps tree and model errors)

use thiserror::Error;

use crate::document::{Cardinality, DocumentType};
use crate::domain::TreeError;
use crate::model::{ConversionError, ModelError};

/// Errors raised while assembling, reading or writing a document tree.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Conversion(#[from] ConversionError),

    #[error("ambiguous query: {count} resources of host type {host_type} match")]
    AmbiguousQuery { host_type: String, count: usize },

    #[error("cardinality mismatch{}: expected {expected}, found {actual}", describe_rel(.rel))]
    CardinalityMismatch {
        rel: Option<String>,
        expected: Cardinality,
        actual: Cardinality,
    },

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("{document_type} document has no {requested}")]
    DocumentTypeMismatch {
        document_type: DocumentType,
        requested: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {message}")]
    Config { message: String },
}

fn describe_rel(rel: &Option<String>) -> String {
    rel.as_ref()
        .map(|rel| format!(" in relationship {rel}"))
        .unwrap_or_default()
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
