//! Typed queries over an assembled document tree.

use std::any::{self, Any};

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::config::RelatedOrder;
use crate::document::{
    Cardinality, DocumentType, ErrorObject, JsonApiVersion, Linkage, Links, Meta, Relationship,
    Relationships, ResourceIdentifier,
};
use crate::dom::error::{DocumentError, DocumentResult};
use crate::dom::node::{DomNodeType, DomResource, DomTree, DomValue};
use crate::dom::DomDocument;
use crate::domain::{NodeId, NodeRef, NodeVisitor, VisitResult};
use crate::model::ResourceId;

type DomNodeRef<'a> = NodeRef<'a, DomNodeType, DomValue>;

/// Collects primary (and optionally included) resource nodes in document order.
struct ResourceCollector {
    include_included: bool,
    found: Vec<NodeId>,
}

impl NodeVisitor<DomNodeType, DomValue> for ResourceCollector {
    fn visit_node(&mut self, node: DomNodeRef<'_>, _depth: usize) -> VisitResult {
        match node.node_type() {
            DomNodeType::Document | DomNodeType::Data | DomNodeType::DataCollection => {
                VisitResult::Continue
            }
            DomNodeType::Included if self.include_included => VisitResult::Continue,
            DomNodeType::Resource => {
                self.found.push(node.id());
                VisitResult::ContinueWithSiblingNodesOnly
            }
            _ => VisitResult::ContinueWithSiblingNodesOnly,
        }
    }
}

fn same_identity(resource: &DomResource, identifier: &ResourceIdentifier) -> bool {
    resource.resource.type_name == identifier.type_name && resource.id == identifier.id
}

/// Read-only queries over a [`DomDocument`].
///
/// Single-result queries return `Ok(None)` when nothing matches and
/// [`DocumentError::AmbiguousQuery`] when more than one resource does.
pub struct DocumentReader<'a> {
    document: &'a DomDocument,
}

impl<'a> DocumentReader<'a> {
    pub fn new(document: &'a DomDocument) -> Self {
        Self { document }
    }

    fn tree(&self) -> &'a DomTree {
        self.document.tree()
    }

    fn top_level(&self, node_type: DomNodeType) -> Option<DomNodeRef<'a>> {
        let tree = self.tree();
        tree.node(tree.root())
            .ok()?
            .children()
            .find(|node| node.node_type() == node_type)
    }

    pub fn get_document_type(&self) -> DocumentType {
        self.document.document_type()
    }

    pub fn get_json_api_version(&self) -> Option<&'a JsonApiVersion> {
        match self.top_level(DomNodeType::JsonApiVersion)?.value() {
            DomValue::JsonApiVersion(version) => Some(version),
            _ => None,
        }
    }

    pub fn get_document_meta(&self) -> Option<&'a Meta> {
        match self.top_level(DomNodeType::Meta)?.value() {
            DomValue::Meta(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn get_document_links(&self) -> Option<&'a Links> {
        match self.top_level(DomNodeType::Links)?.value() {
            DomValue::Links(links) => Some(links),
            _ => None,
        }
    }

    /// Errors of an error document, empty otherwise.
    pub fn get_error_collection(&self) -> &'a [ErrorObject] {
        match self.top_level(DomNodeType::Errors).map(|node| node.value()) {
            Some(DomValue::Errors(errors)) => errors.as_slice(),
            _ => &[],
        }
    }

    // --- Resources ---

    #[instrument(level = "trace", skip(self))]
    fn scan(&self, include_included: bool) -> DocumentResult<Vec<&'a DomResource>> {
        let tree = self.tree();
        let mut collector = ResourceCollector {
            include_included,
            found: Vec::new(),
        };
        tree.accept(tree.root(), &mut collector, 0)?;

        let mut resources = Vec::with_capacity(collector.found.len());
        for id in collector.found {
            if let Some(resource) = tree.node(id)?.value().as_resource() {
                resources.push(resource);
            }
        }
        Ok(resources)
    }

    fn scan_of<T: Any>(&self, include_included: bool) -> DocumentResult<Vec<&'a DomResource>> {
        Ok(self
            .scan(include_included)?
            .into_iter()
            .filter(|resource| resource.host_type().is::<T>())
            .collect())
    }

    fn single<T, F>(&self, include_included: bool, predicate: F) -> DocumentResult<Option<&'a DomResource>>
    where
        T: Any,
        F: Fn(&DomResource) -> bool,
    {
        let candidates = self.scan_of::<T>(include_included)?;
        candidates
            .into_iter()
            .filter(|resource| predicate(resource))
            .at_most_one()
            .map_err(|matches| {
                let count = matches.count();
                debug!(host_type = any::type_name::<T>(), count, "ambiguous resource query");
                DocumentError::AmbiguousQuery {
                    host_type: any::type_name::<T>().to_string(),
                    count,
                }
            })
    }

    /// The single resource of host type `T`.
    pub fn get_resource<T: Any>(&self, include_included: bool) -> DocumentResult<Option<&'a T>> {
        Ok(self
            .single::<T, _>(include_included, |_| true)?
            .and_then(|resource| resource.host.downcast_ref::<T>()))
    }

    /// All resources of host type `T` in document order.
    pub fn get_resource_collection<T: Any>(&self, include_included: bool) -> DocumentResult<Vec<&'a T>> {
        Ok(self
            .scan_of::<T>(include_included)?
            .into_iter()
            .filter_map(|resource| resource.host.downcast_ref::<T>())
            .collect())
    }

    /// The resource of host type `T` whose identifier equals `id`.
    pub fn get_resource_by_id<T: Any, I: ResourceId>(
        &self,
        id: &I,
        include_included: bool,
    ) -> DocumentResult<Option<&'a T>> {
        Ok(self
            .single::<T, _>(include_included, |resource| matches_id(resource, id))?
            .and_then(|resource| resource.host.downcast_ref::<T>()))
    }

    /// Finds the resource owning `relationship` and checks its declared
    /// cardinality, so links-only relationships are checked too.
    fn check_declared(&self, relationship: &Relationship, expected: Cardinality) -> DocumentResult<()> {
        for resource in self.scan(true)? {
            let owner = resource
                .resource
                .relationships
                .iter()
                .flatten()
                .find(|(_, candidate)| std::ptr::eq(*candidate, relationship));
            if let Some((rel, _)) = owner {
                return match resource.declared_cardinality(rel) {
                    Some(declared) if declared != expected => Err(DocumentError::CardinalityMismatch {
                        rel: Some(rel.clone()),
                        expected,
                        actual: declared,
                    }),
                    _ => Ok(()),
                };
            }
        }
        Ok(())
    }

    /// Resolves a to-one relationship against primary and included resources.
    pub fn get_related_resource<R: Any>(&self, relationship: &Relationship) -> DocumentResult<Option<&'a R>> {
        self.check_declared(relationship, Cardinality::ToOne)?;
        let identifier = match &relationship.data {
            Some(Linkage::ToMany(_)) => {
                return Err(DocumentError::CardinalityMismatch {
                    rel: None,
                    expected: Cardinality::ToOne,
                    actual: Cardinality::ToMany,
                })
            }
            None | Some(Linkage::ToOne(None)) => return Ok(None),
            Some(Linkage::ToOne(Some(identifier))) => identifier,
        };
        Ok(self
            .single::<R, _>(true, |resource| same_identity(resource, identifier))?
            .and_then(|resource| resource.host.downcast_ref::<R>()))
    }

    /// Resolves a to-many relationship against primary and included resources.
    ///
    /// Identifiers without a matching resource are skipped.
    pub fn get_related_resource_collection<R: Any>(
        &self,
        relationship: &Relationship,
    ) -> DocumentResult<Vec<&'a R>> {
        self.check_declared(relationship, Cardinality::ToMany)?;
        let identifiers = match &relationship.data {
            Some(Linkage::ToOne(_)) => {
                return Err(DocumentError::CardinalityMismatch {
                    rel: None,
                    expected: Cardinality::ToMany,
                    actual: Cardinality::ToOne,
                })
            }
            None => return Ok(Vec::new()),
            Some(Linkage::ToMany(identifiers)) => identifiers,
        };

        let candidates = self.scan_of::<R>(true)?;
        let related: Vec<&'a DomResource> = match self.document.settings().related_order {
            RelatedOrder::Linkage => identifiers
                .iter()
                .filter_map(|identifier| {
                    candidates
                        .iter()
                        .copied()
                        .find(|resource| same_identity(resource, identifier))
                })
                .collect(),
            RelatedOrder::Document => candidates
                .into_iter()
                .filter(|resource| {
                    identifiers
                        .iter()
                        .any(|identifier| same_identity(resource, identifier))
                })
                .collect(),
        };
        Ok(related
            .into_iter()
            .filter_map(|resource| resource.host.downcast_ref::<R>())
            .collect())
    }

    // --- Per-resource members ---

    fn resource_of_type<T: Any>(&self) -> DocumentResult<Option<&'a DomResource>> {
        self.single::<T, _>(true, |_| true)
    }

    fn resource_of<T: Any>(&self, host: &T) -> DocumentResult<Option<&'a DomResource>> {
        self.single::<T, _>(true, |resource| {
            resource
                .host
                .downcast_ref::<T>()
                .is_some_and(|candidate| std::ptr::eq(candidate, host))
        })
    }

    fn resource_by_id<T: Any, I: ResourceId>(&self, id: &I) -> DocumentResult<Option<&'a DomResource>> {
        self.single::<T, _>(true, |resource| matches_id(resource, id))
    }

    pub fn get_resource_meta<T: Any>(&self) -> DocumentResult<Option<&'a Meta>> {
        Ok(self.resource_of_type::<T>()?.and_then(|r| r.resource.meta.as_ref()))
    }

    pub fn get_resource_meta_of<T: Any>(&self, host: &T) -> DocumentResult<Option<&'a Meta>> {
        Ok(self.resource_of(host)?.and_then(|r| r.resource.meta.as_ref()))
    }

    pub fn get_resource_meta_by_id<T: Any, I: ResourceId>(&self, id: &I) -> DocumentResult<Option<&'a Meta>> {
        Ok(self.resource_by_id::<T, I>(id)?.and_then(|r| r.resource.meta.as_ref()))
    }

    pub fn get_resource_links<T: Any>(&self) -> DocumentResult<Option<&'a Links>> {
        Ok(self.resource_of_type::<T>()?.and_then(|r| r.resource.links.as_ref()))
    }

    pub fn get_resource_links_of<T: Any>(&self, host: &T) -> DocumentResult<Option<&'a Links>> {
        Ok(self.resource_of(host)?.and_then(|r| r.resource.links.as_ref()))
    }

    pub fn get_resource_links_by_id<T: Any, I: ResourceId>(&self, id: &I) -> DocumentResult<Option<&'a Links>> {
        Ok(self.resource_by_id::<T, I>(id)?.and_then(|r| r.resource.links.as_ref()))
    }

    pub fn get_resource_relationships<T: Any>(&self) -> DocumentResult<Option<&'a Relationships>> {
        Ok(self
            .resource_of_type::<T>()?
            .and_then(|r| r.resource.relationships.as_ref()))
    }

    pub fn get_resource_relationships_of<T: Any>(&self, host: &T) -> DocumentResult<Option<&'a Relationships>> {
        Ok(self
            .resource_of(host)?
            .and_then(|r| r.resource.relationships.as_ref()))
    }

    pub fn get_resource_relationships_by_id<T: Any, I: ResourceId>(
        &self,
        id: &I,
    ) -> DocumentResult<Option<&'a Relationships>> {
        Ok(self
            .resource_by_id::<T, I>(id)?
            .and_then(|r| r.resource.relationships.as_ref()))
    }

    // --- Identifier documents ---

    pub fn get_resource_identifier(&self) -> DocumentResult<Option<&'a ResourceIdentifier>> {
        self.expect_document_type(DocumentType::ResourceIdentifier, "resource identifier")?;
        Ok(self
            .top_level(DomNodeType::Data)
            .and_then(|data| data.children().next())
            .and_then(|node| node.value().as_resource_identifier())
            .map(|identifier| &identifier.identifier))
    }

    pub fn get_resource_identifier_collection(&self) -> DocumentResult<Vec<&'a ResourceIdentifier>> {
        self.expect_document_type(
            DocumentType::ResourceIdentifierCollection,
            "resource identifier collection",
        )?;
        Ok(self
            .top_level(DomNodeType::DataCollection)
            .into_iter()
            .flat_map(|data| data.children())
            .filter_map(|node| node.value().as_resource_identifier())
            .map(|identifier| &identifier.identifier)
            .collect())
    }

    fn expect_document_type(&self, expected: DocumentType, requested: &str) -> DocumentResult<()> {
        let document_type = self.get_document_type();
        if document_type != expected {
            return Err(DocumentError::DocumentTypeMismatch {
                document_type,
                requested: requested.to_string(),
            });
        }
        Ok(())
    }
}

fn matches_id<I: ResourceId>(resource: &DomResource, id: &I) -> bool {
    I::from_wire_id(&resource.id).is_ok_and(|candidate| &candidate == id)
}
