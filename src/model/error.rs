//! Service-model errors

use thiserror::Error;

/// Registry and descriptor errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("no resource type registered for host type: {0}")]
    UnknownHostType(String),

    #[error("no resource type registered for wire type: {0}")]
    UnknownResourceType(String),

    #[error("resource type registered twice: {0}")]
    DuplicateResourceType(String),

    #[error("relationship {resource_type}.{rel} points at unregistered host type {related}")]
    UnknownRelatedType {
        resource_type: String,
        rel: String,
        related: String,
    },

    #[error("resource type {resource_type} has no relationship {rel}")]
    UnknownRelationship { resource_type: String, rel: String },

    #[error("resource type {0} has no identity binding")]
    MissingIdentity(String),

    #[error("resource type {resource_type} declares {member} twice")]
    DuplicateMember {
        resource_type: String,
        member: String,
    },
}

/// Failures converting between host values and their wire form.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("cannot convert identifier {value:?} to {target}: {reason}")]
    Identifier {
        value: String,
        target: &'static str,
        reason: String,
    },

    #[error("cannot convert attribute {name}: {source}")]
    Attribute {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("host object is not a {expected}")]
    HostType { expected: String },
}
