//! Node types and payloads of the document tree.

use std::collections::BTreeMap;
use std::fmt;

use crate::document::{
    Attributes, Cardinality, DocumentType, ErrorObject, JsonApiVersion, Link, Links, Meta, Relationship,
    Relationships, Resource, ResourceIdentifier,
};
use crate::domain::Tree;
use crate::model::{HostResource, HostType};
use serde_json::Value;

/// The tree type backing a [`super::DomDocument`].
pub type DomTree = Tree<DomNodeType, DomValue>;

/// Structural role of a node in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomNodeType {
    Document,
    JsonApiVersion,
    Meta,
    Links,
    Data,
    DataCollection,
    Included,
    Errors,
    Resource,
    ResourceIdentifier,
    Attributes,
    Attribute,
    Relationships,
    Relationship,
    Type,
    Id,
    Link,
    HRef,
}

impl DomNodeType {
    /// Diagnostic node name, as shown in tree dumps.
    pub fn name(&self) -> &'static str {
        match self {
            DomNodeType::Document => "document",
            DomNodeType::JsonApiVersion => "jsonapi",
            DomNodeType::Meta => "meta",
            DomNodeType::Links => "links",
            DomNodeType::Data => "data",
            DomNodeType::DataCollection => "data[]",
            DomNodeType::Included => "included",
            DomNodeType::Errors => "errors",
            DomNodeType::Resource => "resource",
            DomNodeType::ResourceIdentifier => "resource-identifier",
            DomNodeType::Attributes => "attributes",
            DomNodeType::Attribute => "attribute",
            DomNodeType::Relationships => "relationships",
            DomNodeType::Relationship => "relationship",
            DomNodeType::Type => "type",
            DomNodeType::Id => "id",
            DomNodeType::Link => "link",
            DomNodeType::HRef => "href",
        }
    }
}

impl fmt::Display for DomNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resource node's payload: the host object and its wire record.
#[derive(Debug)]
pub struct DomResource {
    pub host: HostResource,
    pub id: String,
    pub resource: Resource,
    /// Cardinality declared by the resource type for each relationship name.
    pub cardinalities: BTreeMap<String, Cardinality>,
}

impl DomResource {
    pub fn host_type(&self) -> HostType {
        self.host.host_type()
    }

    /// Declared cardinality of `rel`, `None` if the type does not declare it.
    pub fn declared_cardinality(&self, rel: &str) -> Option<Cardinality> {
        self.cardinalities.get(rel).copied()
    }
}

/// A resource identifier node's payload.
#[derive(Debug, Clone)]
pub struct DomResourceIdentifier {
    pub host_type: HostType,
    pub identifier: ResourceIdentifier,
}

/// Wire value carried by a node, one variant per [`DomNodeType`].
#[derive(Debug)]
pub enum DomValue {
    Document(DocumentType),
    JsonApiVersion(JsonApiVersion),
    Meta(Meta),
    Links(Links),
    Data,
    DataCollection,
    Included,
    Errors(Vec<ErrorObject>),
    Resource(Box<DomResource>),
    ResourceIdentifier(DomResourceIdentifier),
    Attributes(Attributes),
    Attribute { name: String, value: Value },
    Relationships(Relationships),
    Relationship { rel: String, relationship: Relationship },
    Type(String),
    Id(String),
    Link { rel: String, link: Link },
    HRef(String),
}

impl DomValue {
    pub fn as_resource(&self) -> Option<&DomResource> {
        match self {
            DomValue::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_resource_identifier(&self) -> Option<&DomResourceIdentifier> {
        match self {
            DomValue::ResourceIdentifier(identifier) => Some(identifier),
            _ => None,
        }
    }
}
