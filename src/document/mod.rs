//! Wire data model of a JSON:API document.
//!
//! Plain `serde` records; the DOM in [`crate::dom`] is assembled from and
//! written back to these.

pub mod error_object;
pub mod link;
pub mod resource;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use error_object::{ErrorObject, ErrorSource};
pub use link::{JsonApiVersion, Link, Links, Meta};
pub use resource::{
    Attributes, Cardinality, Linkage, Relationship, Relationships, Resource, ResourceIdentifier,
};

use resource::present;

/// Concrete shape of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Neither `data` nor `errors`, only top-level meta/links/jsonapi.
    Document,
    Errors,
    Resource,
    ResourceCollection,
    ResourceIdentifier,
    ResourceIdentifierCollection,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentType::Document => "document",
            DocumentType::Errors => "errors",
            DocumentType::Resource => "resource",
            DocumentType::ResourceCollection => "resource collection",
            DocumentType::ResourceIdentifier => "resource identifier",
            DocumentType::ResourceIdentifierCollection => "resource identifier collection",
        };
        f.write_str(name)
    }
}

/// Primary `data` of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Resource(Option<Resource>),
    ResourceCollection(Vec<Resource>),
    ResourceIdentifier(Option<ResourceIdentifier>),
    ResourceIdentifierCollection(Vec<ResourceIdentifier>),
}

impl PrimaryData {
    pub fn document_type(&self) -> DocumentType {
        match self {
            PrimaryData::Resource(_) => DocumentType::Resource,
            PrimaryData::ResourceCollection(_) => DocumentType::ResourceCollection,
            PrimaryData::ResourceIdentifier(_) => DocumentType::ResourceIdentifier,
            PrimaryData::ResourceIdentifierCollection(_) => {
                DocumentType::ResourceIdentifierCollection
            }
        }
    }

    /// Reads the data as `document_type` where the wire shape allows it.
    ///
    /// Identifiers become resources without attributes, and `null` or an
    /// empty array fit either flavour. `None` if the shapes are incompatible.
    pub fn reinterpret(self, document_type: DocumentType) -> Option<Self> {
        if self.document_type() == document_type {
            return Some(self);
        }
        match (self, document_type) {
            (PrimaryData::ResourceIdentifier(identifier), DocumentType::Resource) => {
                Some(PrimaryData::Resource(identifier.map(Resource::from)))
            }
            (PrimaryData::ResourceIdentifierCollection(identifiers), DocumentType::ResourceCollection) => {
                Some(PrimaryData::ResourceCollection(
                    identifiers.into_iter().map(Resource::from).collect(),
                ))
            }
            (PrimaryData::Resource(None), DocumentType::ResourceIdentifier) => {
                Some(PrimaryData::ResourceIdentifier(None))
            }
            (PrimaryData::ResourceCollection(resources), DocumentType::ResourceIdentifierCollection)
                if resources.is_empty() =>
            {
                Some(PrimaryData::ResourceIdentifierCollection(Vec::new()))
            }
            _ => None,
        }
    }
}

const IDENTIFIER_MEMBERS: [&str; 4] = ["type", "id", "lid", "meta"];

fn is_identifier_shaped(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object
            .keys()
            .all(|key| IDENTIFIER_MEMBERS.contains(&key.as_str()))
    })
}

impl<'de> Deserialize<'de> for PrimaryData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let data = match value {
            Value::Null => PrimaryData::Resource(None),
            Value::Array(items) if !items.is_empty() && items.iter().all(is_identifier_shaped) => {
                let identifiers = serde_json::from_value(Value::Array(items)).map_err(D::Error::custom)?;
                PrimaryData::ResourceIdentifierCollection(identifiers)
            }
            Value::Array(items) => {
                let resources = serde_json::from_value(Value::Array(items)).map_err(D::Error::custom)?;
                PrimaryData::ResourceCollection(resources)
            }
            object @ Value::Object(_) if is_identifier_shaped(&object) => {
                let identifier = serde_json::from_value(object).map_err(D::Error::custom)?;
                PrimaryData::ResourceIdentifier(Some(identifier))
            }
            object @ Value::Object(_) => {
                let resource = serde_json::from_value(object).map_err(D::Error::custom)?;
                PrimaryData::Resource(Some(resource))
            }
            other => {
                return Err(D::Error::custom(format!(
                    "primary data must be an object, an array or null, got {other}"
                )))
            }
        };
        Ok(data)
    }
}

/// A JSON:API top-level document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<JsonApiVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<PrimaryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObject>>,
}

impl Document {
    /// An empty document of the given shape, primary data or errors
    /// initialised to their empty value.
    pub fn empty(document_type: DocumentType) -> Self {
        let mut document = Self::default();
        match document_type {
            DocumentType::Document => {}
            DocumentType::Errors => document.errors = Some(Vec::new()),
            DocumentType::Resource => document.data = Some(PrimaryData::Resource(None)),
            DocumentType::ResourceCollection => {
                document.data = Some(PrimaryData::ResourceCollection(Vec::new()))
            }
            DocumentType::ResourceIdentifier => {
                document.data = Some(PrimaryData::ResourceIdentifier(None))
            }
            DocumentType::ResourceIdentifierCollection => {
                document.data = Some(PrimaryData::ResourceIdentifierCollection(Vec::new()))
            }
        }
        document
    }

    /// Shape of this document. `errors` wins over `data`.
    pub fn document_type(&self) -> DocumentType {
        if self.errors.is_some() {
            return DocumentType::Errors;
        }
        self.data
            .as_ref()
            .map_or(DocumentType::Document, PrimaryData::document_type)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
