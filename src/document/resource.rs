use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::document::link::{Links, Meta};

/// Attribute values keyed by attribute name.
pub type Attributes = Map<String, Value>;

/// Relationships keyed by relationship name.
pub type Relationships = BTreeMap<String, Relationship>;

/// Whether a relationship points at one resource or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ToOne => f.write_str("to-one"),
            Cardinality::ToMany => f.write_str("to-many"),
        }
    }
}

/// A `{type, id}` pointer to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ResourceIdentifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
            meta: None,
        }
    }
}

/// A resource object.
///
/// `attributes` is always serialised, so a resource never reads back as an
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Resource {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: Some(id.into()),
            attributes: Attributes::new(),
            relationships: None,
            links: None,
            meta: None,
        }
    }

    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.id
            .as_ref()
            .map(|id| ResourceIdentifier::new(self.type_name.clone(), id.clone()))
    }
}

impl From<ResourceIdentifier> for Resource {
    fn from(identifier: ResourceIdentifier) -> Self {
        Self {
            meta: identifier.meta,
            ..Resource::new(identifier.type_name, identifier.id)
        }
    }
}

/// Resource linkage of a relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    ToOne(Option<ResourceIdentifier>),
    ToMany(Vec<ResourceIdentifier>),
}

impl Linkage {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Linkage::ToOne(_) => Cardinality::ToOne,
            Linkage::ToMany(_) => Cardinality::ToMany,
        }
    }

    /// Identifiers in linkage order.
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match self {
            Linkage::ToOne(identifier) => identifier.iter().collect(),
            Linkage::ToMany(identifiers) => identifiers.iter().collect(),
        }
    }
}

/// A relationship object. A JSON `null` linkage is kept distinct from an
/// absent `data` member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Linkage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Relationship {
    pub fn to_one(identifier: Option<ResourceIdentifier>) -> Self {
        Self {
            data: Some(Linkage::ToOne(identifier)),
            ..Self::default()
        }
    }

    pub fn to_many(identifiers: Vec<ResourceIdentifier>) -> Self {
        Self {
            data: Some(Linkage::ToMany(identifiers)),
            ..Self::default()
        }
    }
}

/// Deserialises a member that is present, `null` included, as `Some`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
