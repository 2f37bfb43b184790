//! Assembles document trees from host objects (build) or wire documents (parse).

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::config::Settings;
use crate::document::{
    Attributes, Cardinality, Document, DocumentType, ErrorObject, JsonApiVersion, Linkage, Links,
    Meta, PrimaryData, Relationship, Relationships, Resource, ResourceIdentifier,
};
use crate::dom::error::{DocumentError, DocumentResult};
use crate::dom::node::{DomNodeType, DomResource, DomResourceIdentifier, DomTree, DomValue};
use crate::dom::{HostData, HostDocument};
use crate::domain::{NodeId, NodeShape, Tree};
use crate::model::{HostLinkage, HostResource, ResourceType, ServiceModel};

fn declared_cardinalities(resource_type: &ResourceType) -> BTreeMap<String, Cardinality> {
    resource_type
        .relationships()
        .iter()
        .map(|relationship| (relationship.rel().to_string(), relationship.cardinality()))
        .collect()
}

fn missing_identity(type_name: &str) -> DocumentError {
    DocumentError::MalformedDocument(format!("resource of type {type_name} has no id"))
}

/// Builds one document tree. Enforces the top-level member rules while
/// nodes are added under the root.
pub(crate) struct DomAssembler<'m> {
    model: &'m ServiceModel,
    settings: &'m Settings,
    tree: DomTree,
    identities: HashSet<(String, String)>,
    has_data: bool,
    has_included: bool,
    has_errors: bool,
}

impl<'m> DomAssembler<'m> {
    pub(crate) fn new(model: &'m ServiceModel, settings: &'m Settings, document_type: DocumentType) -> Self {
        let tree = Tree::new(
            DomNodeType::Document,
            DomNodeType::Document.name(),
            NodeShape::Collection,
            DomValue::Document(document_type),
        );
        Self {
            model,
            settings,
            tree,
            identities: HashSet::new(),
            has_data: false,
            has_included: false,
            has_errors: false,
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub(crate) fn build(mut self, host: HostDocument) -> DocumentResult<DomTree> {
        let HostDocument {
            jsonapi,
            meta,
            links,
            data,
            included,
        } = host;

        let jsonapi = jsonapi.or_else(|| self.settings.jsonapi_version.clone().map(JsonApiVersion::new));
        self.add_header(jsonapi, meta.as_ref(), links.as_ref())?;

        match data {
            HostData::None => {}
            HostData::Resource(resource) => {
                let data = self.open(DomNodeType::Data)?;
                if let Some(host) = resource {
                    let node = self.project_node(host)?;
                    self.tree.add(data, node)?;
                }
            }
            HostData::ResourceCollection(resources) => {
                let data = self.open(DomNodeType::DataCollection)?;
                for host in resources {
                    let node = self.project_node(host)?;
                    self.tree.add(data, node)?;
                }
            }
            HostData::ResourceIdentifier(resource) => {
                let data = self.open(DomNodeType::Data)?;
                if let Some(host) = resource {
                    let identifier = self.identify(&host)?;
                    let node = self.identifier_node(&identifier.identifier)?;
                    self.tree.add(data, node)?;
                }
            }
            HostData::ResourceIdentifierCollection(resources) => {
                let data = self.open(DomNodeType::DataCollection)?;
                for host in resources {
                    let identifier = self.identify(&host)?;
                    let node = self.identifier_node(&identifier.identifier)?;
                    self.tree.add(data, node)?;
                }
            }
            HostData::Errors(errors) => self.add_errors(errors)?,
        }

        if !included.is_empty() {
            let container = self.open(DomNodeType::Included)?;
            for host in included {
                let node = self.project_node(host)?;
                self.tree.add(container, node)?;
            }
        }

        debug!(nodes = self.tree.node_count(), "built document tree");
        Ok(self.tree)
    }

    #[instrument(level = "debug", skip_all)]
    pub(crate) fn parse(mut self, document: &Document) -> DocumentResult<DomTree> {
        self.add_header(
            document.jsonapi.clone(),
            document.meta.as_ref(),
            document.links.as_ref(),
        )?;

        match &document.data {
            None => {}
            Some(PrimaryData::Resource(resource)) => {
                let data = self.open(DomNodeType::Data)?;
                if let Some(resource) = resource {
                    let node = self.materialize_node(resource)?;
                    self.tree.add(data, node)?;
                }
            }
            Some(PrimaryData::ResourceCollection(resources)) => {
                let data = self.open(DomNodeType::DataCollection)?;
                for resource in resources {
                    let node = self.materialize_node(resource)?;
                    self.tree.add(data, node)?;
                }
            }
            Some(PrimaryData::ResourceIdentifier(identifier)) => {
                let data = self.open(DomNodeType::Data)?;
                if let Some(identifier) = identifier {
                    let node = self.identifier_node(identifier)?;
                    self.tree.add(data, node)?;
                }
            }
            Some(PrimaryData::ResourceIdentifierCollection(identifiers)) => {
                let data = self.open(DomNodeType::DataCollection)?;
                for identifier in identifiers {
                    let node = self.identifier_node(identifier)?;
                    self.tree.add(data, node)?;
                }
            }
        }

        if let Some(included) = &document.included {
            let container = self.open(DomNodeType::Included)?;
            for resource in included {
                let node = self.materialize_node(resource)?;
                self.tree.add(container, node)?;
            }
        }

        if let Some(errors) = &document.errors {
            self.add_errors(errors.clone())?;
        }

        debug!(nodes = self.tree.node_count(), "parsed document tree");
        Ok(self.tree)
    }

    // --- Top level ---

    fn add_header(
        &mut self,
        jsonapi: Option<JsonApiVersion>,
        meta: Option<&Meta>,
        links: Option<&Links>,
    ) -> DocumentResult<()> {
        if let Some(jsonapi) = jsonapi {
            let node = self.leaf(DomNodeType::JsonApiVersion, DomValue::JsonApiVersion(jsonapi));
            self.add_top_level(node, DomNodeType::JsonApiVersion)?;
        }
        if let Some(meta) = meta {
            let node = self.meta_node(meta);
            self.add_top_level(node, DomNodeType::Meta)?;
        }
        if let Some(links) = links {
            let node = self.links_node(links)?;
            self.add_top_level(node, DomNodeType::Links)?;
        }
        Ok(())
    }

    fn add_errors(&mut self, errors: Vec<ErrorObject>) -> DocumentResult<()> {
        let node = self.leaf(DomNodeType::Errors, DomValue::Errors(errors));
        self.add_top_level(node, DomNodeType::Errors)
    }

    /// Creates an empty Data, DataCollection or Included node under the root.
    fn open(&mut self, node_type: DomNodeType) -> DocumentResult<NodeId> {
        let (shape, value) = match node_type {
            DomNodeType::Data => (NodeShape::Container, DomValue::Data),
            DomNodeType::DataCollection => (NodeShape::Collection, DomValue::DataCollection),
            _ => (NodeShape::Collection, DomValue::Included),
        };
        let node = self.tree.create_node(node_type, node_type.name(), shape, value);
        self.add_top_level(node, node_type)?;
        Ok(node)
    }

    fn add_top_level(&mut self, node: NodeId, node_type: DomNodeType) -> DocumentResult<()> {
        match node_type {
            DomNodeType::Data | DomNodeType::DataCollection => {
                if self.has_errors {
                    return Err(malformed("a document cannot contain both data and errors"));
                }
                if self.has_data {
                    return Err(malformed("a document has at most one primary data member"));
                }
                self.has_data = true;
            }
            DomNodeType::Included => {
                if !self.has_data {
                    return Err(malformed("included resources require primary data"));
                }
                if self.has_included {
                    return Err(malformed("a document has at most one included member"));
                }
                self.has_included = true;
            }
            DomNodeType::Errors => {
                if self.has_data {
                    return Err(malformed("a document cannot contain both data and errors"));
                }
                if self.has_errors {
                    return Err(malformed("a document has at most one errors member"));
                }
                self.has_errors = true;
            }
            _ => {}
        }
        let root = self.tree.root();
        self.tree.add(root, node)?;
        Ok(())
    }

    // --- Host <-> wire ---

    fn project_node(&mut self, host: HostResource) -> DocumentResult<NodeId> {
        let resource = self.project(host)?;
        self.resource_node(resource)
    }

    fn materialize_node(&mut self, resource: &Resource) -> DocumentResult<NodeId> {
        let resource = self.materialize(resource)?;
        self.resource_node(resource)
    }

    /// Derives the wire record of a host object.
    fn project(&self, host: HostResource) -> DocumentResult<DomResource> {
        let model = self.model;
        let resource_type = model.resolve_resource_type_of(host.host_type())?;
        let value = host.as_any();
        let id = resource_type
            .get_id(value)?
            .ok_or_else(|| missing_identity(resource_type.type_name()))?;

        let mut attributes = Attributes::new();
        for attribute in resource_type.attributes() {
            attributes.insert(attribute.name().to_string(), attribute.get(value)?);
        }

        let mut relationships = Relationships::new();
        for relationship in resource_type.relationships() {
            let related = model.resolve_resource_type_of(relationship.related())?;
            let identifier = |id: String| ResourceIdentifier::new(related.type_name(), id);
            let data = match relationship.get_linkage(value)? {
                HostLinkage::ToOne(id) => Linkage::ToOne(id.map(identifier)),
                HostLinkage::ToMany(ids) => Linkage::ToMany(ids.into_iter().map(identifier).collect()),
            };
            relationships.insert(
                relationship.rel().to_string(),
                Relationship {
                    links: relationship.get_links(value)?,
                    data: Some(data),
                    meta: None,
                },
            );
        }

        let resource = Resource {
            type_name: resource_type.type_name().to_string(),
            id: Some(id.clone()),
            attributes,
            relationships: (!relationships.is_empty()).then_some(relationships),
            links: resource_type.get_links(value)?,
            meta: resource_type.get_meta(value)?,
        };
        debug!(type_name = %resource.type_name, %id, "projected host resource");
        Ok(DomResource {
            host,
            id,
            resource,
            cardinalities: declared_cardinalities(resource_type),
        })
    }

    /// Allocates and populates a host object from a wire resource.
    fn materialize(&self, resource: &Resource) -> DocumentResult<DomResource> {
        let model = self.model;
        let resource_type = model.resolve_resource_type_by_name(&resource.type_name)?;
        let id = resource
            .id
            .clone()
            .ok_or_else(|| missing_identity(&resource.type_name))?;

        let mut host = resource_type.create();
        resource_type.set_id(host.as_any_mut(), &id)?;

        for (name, value) in &resource.attributes {
            match resource_type.attribute(name) {
                Some(attribute) => attribute.set(host.as_any_mut(), value.clone())?,
                None => self.undeclared(resource_type, "attribute", name)?,
            }
        }

        for (rel, relationship) in resource.relationships.iter().flatten() {
            let Some(descriptor) = resource_type.relationship(rel) else {
                self.undeclared(resource_type, "relationship", rel)?;
                continue;
            };
            if let Some(linkage) = &relationship.data {
                if linkage.cardinality() != descriptor.cardinality() {
                    return Err(DocumentError::CardinalityMismatch {
                        rel: Some(rel.clone()),
                        expected: descriptor.cardinality(),
                        actual: linkage.cardinality(),
                    });
                }
                let related = model.resolve_resource_type_of(descriptor.related())?;
                if let Some(stray) = linkage
                    .identifiers()
                    .into_iter()
                    .find(|identifier| identifier.type_name != related.type_name())
                {
                    return Err(malformed(&format!(
                        "relationship {rel} of {} links to type {}, expected {}",
                        resource.type_name,
                        stray.type_name,
                        related.type_name()
                    )));
                }
                let host_linkage = match linkage {
                    Linkage::ToOne(identifier) => {
                        HostLinkage::ToOne(identifier.as_ref().map(|identifier| identifier.id.clone()))
                    }
                    Linkage::ToMany(identifiers) => HostLinkage::ToMany(
                        identifiers
                            .iter()
                            .map(|identifier| identifier.id.clone())
                            .collect(),
                    ),
                };
                descriptor.set_linkage(host.as_any_mut(), host_linkage)?;
            }
            if let Some(links) = &relationship.links {
                descriptor.set_links(host.as_any_mut(), links.clone())?;
            }
        }

        if let Some(links) = &resource.links {
            resource_type.set_links(host.as_any_mut(), links.clone())?;
        }
        if let Some(meta) = &resource.meta {
            resource_type.set_meta(host.as_any_mut(), meta.clone())?;
        }

        debug!(type_name = %resource.type_name, %id, "materialized host resource");
        Ok(DomResource {
            host,
            id,
            resource: resource.clone(),
            cardinalities: declared_cardinalities(resource_type),
        })
    }

    fn identify(&self, host: &HostResource) -> DocumentResult<DomResourceIdentifier> {
        let resource_type = self.model.resolve_resource_type_of(host.host_type())?;
        let id = resource_type
            .get_id(host.as_any())?
            .ok_or_else(|| missing_identity(resource_type.type_name()))?;
        Ok(DomResourceIdentifier {
            host_type: resource_type.host_type(),
            identifier: ResourceIdentifier::new(resource_type.type_name(), id),
        })
    }

    fn undeclared(&self, resource_type: &ResourceType, kind: &str, name: &str) -> DocumentResult<()> {
        if self.settings.strict_attributes {
            return Err(malformed(&format!(
                "{kind} {name} is not declared by resource type {}",
                resource_type.type_name()
            )));
        }
        warn!(type_name = resource_type.type_name(), kind, name, "ignoring undeclared wire member");
        Ok(())
    }

    // --- Subtrees ---

    fn leaf(&mut self, node_type: DomNodeType, value: DomValue) -> NodeId {
        self.tree
            .create_node(node_type, node_type.name(), NodeShape::Node, value)
    }

    fn resource_node(&mut self, dom: DomResource) -> DocumentResult<NodeId> {
        let type_name = dom.resource.type_name.clone();
        let id = dom.id.clone();
        if !self.identities.insert((type_name.clone(), id.clone())) {
            return Err(malformed(&format!("duplicate resource {type_name}:{id}")));
        }

        let mut children = vec![
            self.leaf(DomNodeType::Type, DomValue::Type(type_name.clone())),
            self.leaf(DomNodeType::Id, DomValue::Id(id.clone())),
            self.attributes_node(&dom.resource.attributes)?,
        ];
        if let Some(relationships) = &dom.resource.relationships {
            children.push(self.relationships_node(relationships)?);
        }
        if let Some(links) = &dom.resource.links {
            children.push(self.links_node(links)?);
        }
        if let Some(meta) = &dom.resource.meta {
            children.push(self.meta_node(meta));
        }

        let node = self.tree.create_node(
            DomNodeType::Resource,
            DomNodeType::Resource.name(),
            NodeShape::Collection,
            DomValue::Resource(Box::new(dom)),
        );
        self.tree.attach_attribute(node, "type", type_name)?;
        self.tree.attach_attribute(node, "id", id)?;
        self.tree.add_many(node, children)?;
        Ok(node)
    }

    fn identifier_node(&mut self, identifier: &ResourceIdentifier) -> DocumentResult<NodeId> {
        let resource_type = self.model.resolve_resource_type_by_name(&identifier.type_name)?;
        resource_type.check_id(&identifier.id)?;
        let host_type = resource_type.host_type();

        let mut children = vec![
            self.leaf(DomNodeType::Type, DomValue::Type(identifier.type_name.clone())),
            self.leaf(DomNodeType::Id, DomValue::Id(identifier.id.clone())),
        ];
        if let Some(meta) = &identifier.meta {
            children.push(self.meta_node(meta));
        }

        let node = self.tree.create_node(
            DomNodeType::ResourceIdentifier,
            DomNodeType::ResourceIdentifier.name(),
            NodeShape::Collection,
            DomValue::ResourceIdentifier(DomResourceIdentifier {
                host_type,
                identifier: identifier.clone(),
            }),
        );
        self.tree
            .attach_attribute(node, "type", identifier.type_name.clone())?;
        self.tree.attach_attribute(node, "id", identifier.id.clone())?;
        self.tree.add_many(node, children)?;
        Ok(node)
    }

    fn attributes_node(&mut self, attributes: &Attributes) -> DocumentResult<NodeId> {
        let container = self.tree.create_node(
            DomNodeType::Attributes,
            DomNodeType::Attributes.name(),
            NodeShape::Collection,
            DomValue::Attributes(attributes.clone()),
        );
        for (name, value) in attributes {
            let node = self.leaf(
                DomNodeType::Attribute,
                DomValue::Attribute {
                    name: name.clone(),
                    value: value.clone(),
                },
            );
            self.tree.attach_attribute(node, "name", name.clone())?;
            self.tree.add(container, node)?;
        }
        Ok(container)
    }

    fn relationships_node(&mut self, relationships: &Relationships) -> DocumentResult<NodeId> {
        let container = self.tree.create_node(
            DomNodeType::Relationships,
            DomNodeType::Relationships.name(),
            NodeShape::Collection,
            DomValue::Relationships(relationships.clone()),
        );
        for (rel, relationship) in relationships {
            let node = self.relationship_node(rel, relationship)?;
            self.tree.add(container, node)?;
        }
        Ok(container)
    }

    fn relationship_node(&mut self, rel: &str, relationship: &Relationship) -> DocumentResult<NodeId> {
        let node = self.tree.create_node(
            DomNodeType::Relationship,
            DomNodeType::Relationship.name(),
            NodeShape::Collection,
            DomValue::Relationship {
                rel: rel.to_string(),
                relationship: relationship.clone(),
            },
        );
        self.tree.attach_attribute(node, "rel", rel.to_string())?;

        if let Some(links) = &relationship.links {
            let links = self.links_node(links)?;
            self.tree.add(node, links)?;
        }
        match &relationship.data {
            None => {}
            Some(Linkage::ToOne(identifier)) => {
                let data = self.tree.create_node(
                    DomNodeType::Data,
                    DomNodeType::Data.name(),
                    NodeShape::Container,
                    DomValue::Data,
                );
                if let Some(identifier) = identifier {
                    let child = self.identifier_node(identifier)?;
                    self.tree.add(data, child)?;
                }
                self.tree.add(node, data)?;
            }
            Some(Linkage::ToMany(identifiers)) => {
                let data = self.tree.create_node(
                    DomNodeType::DataCollection,
                    DomNodeType::DataCollection.name(),
                    NodeShape::Collection,
                    DomValue::DataCollection,
                );
                for identifier in identifiers {
                    let child = self.identifier_node(identifier)?;
                    self.tree.add(data, child)?;
                }
                self.tree.add(node, data)?;
            }
        }
        if let Some(meta) = &relationship.meta {
            let meta = self.meta_node(meta);
            self.tree.add(node, meta)?;
        }
        Ok(node)
    }

    fn links_node(&mut self, links: &Links) -> DocumentResult<NodeId> {
        let container = self.tree.create_node(
            DomNodeType::Links,
            DomNodeType::Links.name(),
            NodeShape::Collection,
            DomValue::Links(links.clone()),
        );
        for (rel, link) in links {
            let node = self.tree.create_node(
                DomNodeType::Link,
                DomNodeType::Link.name(),
                NodeShape::Container,
                DomValue::Link {
                    rel: rel.clone(),
                    link: link.clone(),
                },
            );
            self.tree.attach_attribute(node, "rel", rel.clone())?;
            let href = self.leaf(DomNodeType::HRef, DomValue::HRef(link.href.clone()));
            self.tree.add(node, href)?;
            self.tree.add(container, node)?;
        }
        Ok(container)
    }

    fn meta_node(&mut self, meta: &Meta) -> NodeId {
        self.leaf(DomNodeType::Meta, DomValue::Meta(meta.clone()))
    }
}

fn malformed(message: &str) -> DocumentError {
    DocumentError::MalformedDocument(message.to_string())
}
