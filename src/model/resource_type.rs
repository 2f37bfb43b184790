//! Resource type descriptors.
//!
//! A descriptor maps one host type to a wire resource type through
//! already-resolved accessor closures. The closures work on `&dyn Any` so
//! the assembler can drive any registered host type without generics.

use std::any::{self, Any};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::document::{Cardinality, Links, Meta};
use crate::model::conversion::{from_wire_value, to_wire_value, ResourceId};
use crate::model::error::{ConversionError, ModelError};
use crate::model::host::{HostResource, HostType};

type Getter<O> = Box<dyn Fn(&dyn Any) -> Result<O, ConversionError> + Send + Sync>;
type Setter<I> = Box<dyn Fn(&mut dyn Any, I) -> Result<(), ConversionError> + Send + Sync>;
type IdSetter = Box<dyn Fn(&mut dyn Any, &str) -> Result<(), ConversionError> + Send + Sync>;
type Factory = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type Outcome<O> = Result<O, ConversionError>;

/// Host-side linkage of a relationship: wire ids of the related resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostLinkage {
    ToOne(Option<String>),
    ToMany(Vec<String>),
}

impl HostLinkage {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            HostLinkage::ToOne(_) => Cardinality::ToOne,
            HostLinkage::ToMany(_) => Cardinality::ToMany,
        }
    }
}

fn host<T: Any>(value: &dyn Any) -> Result<&T, ConversionError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| ConversionError::HostType {
            expected: any::type_name::<T>().to_string(),
        })
}

fn host_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, ConversionError> {
    value
        .downcast_mut::<T>()
        .ok_or_else(|| ConversionError::HostType {
            expected: any::type_name::<T>().to_string(),
        })
}

fn wire_ids<I: ResourceId>(ids: &[String]) -> Result<Vec<I>, ConversionError> {
    ids.iter().map(|id| I::from_wire_id(id)).collect()
}

struct Identity {
    get: Getter<Option<String>>,
    set: IdSetter,
    check: Box<dyn Fn(&str) -> Result<(), ConversionError> + Send + Sync>,
}

/// Binding of one wire attribute to a host property.
pub struct AttributeDescriptor {
    name: String,
    get: Getter<Value>,
    set: Setter<Value>,
}

impl AttributeDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, host: &dyn Any) -> Result<Value, ConversionError> {
        (self.get)(host)
    }

    pub fn set(&self, host: &mut dyn Any, value: Value) -> Result<(), ConversionError> {
        (self.set)(host, value)
    }
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

struct LinksBinding {
    get: Getter<Option<Links>>,
    set: Setter<Links>,
}

struct MetaBinding {
    get: Getter<Option<Meta>>,
    set: Setter<Meta>,
}

/// Binding of one wire relationship to a host property.
pub struct RelationshipDescriptor {
    rel: String,
    cardinality: Cardinality,
    related: HostType,
    get: Getter<HostLinkage>,
    set: Setter<HostLinkage>,
    links: Option<LinksBinding>,
}

impl RelationshipDescriptor {
    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Host type of the resources this relationship points at.
    pub fn related(&self) -> HostType {
        self.related
    }

    pub fn get_linkage(&self, host: &dyn Any) -> Result<HostLinkage, ConversionError> {
        (self.get)(host)
    }

    pub fn set_linkage(&self, host: &mut dyn Any, linkage: HostLinkage) -> Result<(), ConversionError> {
        (self.set)(host, linkage)
    }

    pub fn get_links(&self, host: &dyn Any) -> Result<Option<Links>, ConversionError> {
        match &self.links {
            Some(binding) => (binding.get)(host),
            None => Ok(None),
        }
    }

    /// Stores wire links on the host; a no-op without a links binding.
    pub fn set_links(&self, host: &mut dyn Any, links: Links) -> Result<(), ConversionError> {
        match &self.links {
            Some(binding) => (binding.set)(host, links),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RelationshipDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipDescriptor")
            .field("rel", &self.rel)
            .field("cardinality", &self.cardinality)
            .field("related", &self.related)
            .finish_non_exhaustive()
    }
}

/// Describes how a host type maps to a wire resource.
pub struct ResourceType {
    type_name: String,
    host_type: HostType,
    identity: Identity,
    attributes: Vec<AttributeDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
    links: Option<LinksBinding>,
    meta: Option<MetaBinding>,
    factory: Factory,
}

impl ResourceType {
    /// Starts a descriptor for `T` with the wire type name `type_name`.
    /// `T::default()` is the host factory unless [`ResourceTypeBuilder::factory`]
    /// replaces it.
    pub fn builder<T: Any + Default>(type_name: impl Into<String>) -> ResourceTypeBuilder<T> {
        ResourceTypeBuilder::new(type_name.into())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn relationships(&self) -> &[RelationshipDescriptor] {
        &self.relationships
    }

    pub fn relationship(&self, rel: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|relationship| relationship.rel == rel)
    }

    /// Wire id of a host object, `None` if it has no identity yet.
    pub fn get_id(&self, host: &dyn Any) -> Result<Option<String>, ConversionError> {
        (self.identity.get)(host)
    }

    pub fn set_id(&self, host: &mut dyn Any, id: &str) -> Result<(), ConversionError> {
        (self.identity.set)(host, id)
    }

    /// Checks that a wire id converts to the host identifier type.
    pub fn check_id(&self, id: &str) -> Result<(), ConversionError> {
        (self.identity.check)(id)
    }

    pub fn get_links(&self, host: &dyn Any) -> Result<Option<Links>, ConversionError> {
        match &self.links {
            Some(binding) => (binding.get)(host),
            None => Ok(None),
        }
    }

    pub fn set_links(&self, host: &mut dyn Any, links: Links) -> Result<(), ConversionError> {
        match &self.links {
            Some(binding) => (binding.set)(host, links),
            None => Ok(()),
        }
    }

    pub fn get_meta(&self, host: &dyn Any) -> Result<Option<Meta>, ConversionError> {
        match &self.meta {
            Some(binding) => (binding.get)(host),
            None => Ok(None),
        }
    }

    pub fn set_meta(&self, host: &mut dyn Any, meta: Meta) -> Result<(), ConversionError> {
        match &self.meta {
            Some(binding) => (binding.set)(host, meta),
            None => Ok(()),
        }
    }

    /// Allocates a fresh host object.
    pub fn create(&self) -> HostResource {
        HostResource::from_boxed(self.host_type, (self.factory)())
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("type_name", &self.type_name)
            .field("host_type", &self.host_type)
            .field("attributes", &self.attributes)
            .field("relationships", &self.relationships)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`ResourceType`].
pub struct ResourceTypeBuilder<T> {
    type_name: String,
    identity: Option<Identity>,
    attributes: Vec<AttributeDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
    relationship_links: Vec<(String, LinksBinding)>,
    links: Option<LinksBinding>,
    meta: Option<MetaBinding>,
    factory: Factory,
    _host: PhantomData<fn() -> T>,
}

impl<T: Any + Default> ResourceTypeBuilder<T> {
    fn new(type_name: String) -> Self {
        Self::with_factory(type_name, T::default)
    }
}

impl<T: Any> ResourceTypeBuilder<T> {
    /// Starts a descriptor for a host type without a `Default` impl.
    pub fn with_factory<F>(type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            identity: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
            relationship_links: Vec::new(),
            links: None,
            meta: None,
            factory: Box::new(move || -> Box<dyn Any> { Box::new(factory()) }),
            _host: PhantomData,
        }
    }

    /// Binds the resource identity.
    pub fn id<I, G, S>(mut self, get: G, set: S) -> Self
    where
        I: ResourceId,
        G: Fn(&T) -> Option<I> + Send + Sync + 'static,
        S: Fn(&mut T, I) + Send + Sync + 'static,
    {
        self.identity = Some(Identity {
            get: Box::new(move |value: &dyn Any| -> Outcome<Option<String>> {
                Ok(get(host::<T>(value)?).map(|id| id.to_wire_id()))
            }),
            set: Box::new(move |value: &mut dyn Any, id: &str| -> Outcome<()> {
                let id = I::from_wire_id(id)?;
                set(host_mut::<T>(value)?, id);
                Ok(())
            }),
            check: Box::new(|id: &str| -> Outcome<()> { I::from_wire_id(id).map(|_| ()) }),
        });
        self
    }

    /// Binds a wire attribute. Values convert through `serde`.
    pub fn attribute<A, G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        A: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> A + Send + Sync + 'static,
        S: Fn(&mut T, A) + Send + Sync + 'static,
    {
        let name = name.into();
        let get_name = name.clone();
        let set_name = name.clone();
        self.attributes.push(AttributeDescriptor {
            name,
            get: Box::new(move |value: &dyn Any| -> Outcome<Value> {
                to_wire_value(&get_name, &get(host::<T>(value)?))
            }),
            set: Box::new(move |value: &mut dyn Any, wire: Value| -> Outcome<()> {
                let converted = from_wire_value::<A>(&set_name, wire)?;
                set(host_mut::<T>(value)?, converted);
                Ok(())
            }),
        });
        self
    }

    /// Binds a to-one relationship to resources of host type `R`.
    pub fn to_one<R, I, G, S>(mut self, rel: impl Into<String>, get: G, set: S) -> Self
    where
        R: Any,
        I: ResourceId,
        G: Fn(&T) -> Option<I> + Send + Sync + 'static,
        S: Fn(&mut T, Option<I>) + Send + Sync + 'static,
    {
        self.relationships.push(RelationshipDescriptor {
            rel: rel.into(),
            cardinality: Cardinality::ToOne,
            related: HostType::of::<R>(),
            get: Box::new(move |value: &dyn Any| -> Outcome<HostLinkage> {
                let id = get(host::<T>(value)?);
                Ok(HostLinkage::ToOne(id.map(|id| id.to_wire_id())))
            }),
            set: Box::new(move |value: &mut dyn Any, linkage: HostLinkage| -> Outcome<()> {
                let id = match linkage {
                    HostLinkage::ToOne(Some(id)) => Some(I::from_wire_id(&id)?),
                    HostLinkage::ToOne(None) => None,
                    HostLinkage::ToMany(ids) => wire_ids::<I>(&ids)?.into_iter().next(),
                };
                set(host_mut::<T>(value)?, id);
                Ok(())
            }),
            links: None,
        });
        self
    }

    /// Binds a to-many relationship to resources of host type `R`.
    pub fn to_many<R, I, G, S>(mut self, rel: impl Into<String>, get: G, set: S) -> Self
    where
        R: Any,
        I: ResourceId,
        G: Fn(&T) -> Vec<I> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<I>) + Send + Sync + 'static,
    {
        self.relationships.push(RelationshipDescriptor {
            rel: rel.into(),
            cardinality: Cardinality::ToMany,
            related: HostType::of::<R>(),
            get: Box::new(move |value: &dyn Any| -> Outcome<HostLinkage> {
                let ids = get(host::<T>(value)?);
                Ok(HostLinkage::ToMany(ids.iter().map(ResourceId::to_wire_id).collect()))
            }),
            set: Box::new(move |value: &mut dyn Any, linkage: HostLinkage| -> Outcome<()> {
                let ids = match linkage {
                    HostLinkage::ToMany(ids) => wire_ids::<I>(&ids)?,
                    HostLinkage::ToOne(Some(id)) => vec![I::from_wire_id(&id)?],
                    HostLinkage::ToOne(None) => Vec::new(),
                };
                set(host_mut::<T>(value)?, ids);
                Ok(())
            }),
            links: None,
        });
        self
    }

    /// Binds the links of relationship `rel`, declared before or after.
    pub fn relationship_links<G, S>(mut self, rel: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<Links> + Send + Sync + 'static,
        S: Fn(&mut T, Links) + Send + Sync + 'static,
    {
        self.relationship_links.push((rel.into(), links_binding(get, set)));
        self
    }

    /// Binds the resource-level links.
    pub fn links<G, S>(mut self, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<Links> + Send + Sync + 'static,
        S: Fn(&mut T, Links) + Send + Sync + 'static,
    {
        self.links = Some(links_binding(get, set));
        self
    }

    /// Binds the resource-level meta.
    pub fn meta<G, S>(mut self, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<Meta> + Send + Sync + 'static,
        S: Fn(&mut T, Meta) + Send + Sync + 'static,
    {
        self.meta = Some(MetaBinding {
            get: Box::new(move |value: &dyn Any| -> Outcome<Option<Meta>> {
                Ok(get(host::<T>(value)?))
            }),
            set: Box::new(move |value: &mut dyn Any, meta: Meta| -> Outcome<()> {
                set(host_mut::<T>(value)?, meta);
                Ok(())
            }),
        });
        self
    }

    /// Replaces the host factory.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Box::new(move || -> Box<dyn Any> { Box::new(factory()) });
        self
    }

    pub fn build(self) -> Result<ResourceType, ModelError> {
        let identity = self
            .identity
            .ok_or_else(|| ModelError::MissingIdentity(self.type_name.clone()))?;

        let mut members = HashSet::new();
        let names = self
            .attributes
            .iter()
            .map(|attribute| attribute.name.as_str())
            .chain(self.relationships.iter().map(|relationship| relationship.rel.as_str()));
        for name in names {
            if !members.insert(name) {
                return Err(ModelError::DuplicateMember {
                    resource_type: self.type_name.clone(),
                    member: name.to_string(),
                });
            }
        }

        let mut relationships = self.relationships;
        for (rel, binding) in self.relationship_links {
            let relationship = relationships
                .iter_mut()
                .find(|relationship| relationship.rel == rel)
                .ok_or_else(|| ModelError::UnknownRelationship {
                    resource_type: self.type_name.clone(),
                    rel: rel.clone(),
                })?;
            relationship.links = Some(binding);
        }

        debug!(
            type_name = %self.type_name,
            host_type = any::type_name::<T>(),
            attributes = self.attributes.len(),
            relationships = relationships.len(),
            "built resource type"
        );
        Ok(ResourceType {
            type_name: self.type_name,
            host_type: HostType::of::<T>(),
            identity,
            attributes: self.attributes,
            relationships,
            links: self.links,
            meta: self.meta,
            factory: self.factory,
        })
    }
}

fn links_binding<T, G, S>(get: G, set: S) -> LinksBinding
where
    T: Any,
    G: Fn(&T) -> Option<Links> + Send + Sync + 'static,
    S: Fn(&mut T, Links) + Send + Sync + 'static,
{
    LinksBinding {
        get: Box::new(move |value: &dyn Any| -> Outcome<Option<Links>> {
            Ok(get(host::<T>(value)?))
        }),
        set: Box::new(move |value: &mut dyn Any, links: Links| -> Outcome<()> {
            set(host_mut::<T>(value)?, links);
            Ok(())
        }),
    }
}
