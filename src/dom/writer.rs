//! Reconstructs the wire document from a document tree.

use tracing::{debug, instrument};

use crate::document::{Document, DocumentType, PrimaryData, Resource, ResourceIdentifier};
use crate::dom::error::{DocumentError, DocumentResult};
use crate::dom::node::{DomNodeType, DomValue};
use crate::dom::DomDocument;
use crate::domain::NodeRef;

type DomNodeRef<'a> = NodeRef<'a, DomNodeType, DomValue>;

/// Walks the root's children in document order and fills the wire document.
pub struct DocumentWriter<'a> {
    document: &'a DomDocument,
}

impl<'a> DocumentWriter<'a> {
    pub fn new(document: &'a DomDocument) -> Self {
        Self { document }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn write_document(&self) -> DocumentResult<Document> {
        let document_type = self.document.document_type();
        let tree = self.document.tree();
        let mut document = Document::empty(document_type);

        for node in tree.node(tree.root())?.children() {
            match (node.node_type(), node.value()) {
                (DomNodeType::JsonApiVersion, DomValue::JsonApiVersion(version)) => {
                    document.jsonapi = Some(version.clone());
                }
                (DomNodeType::Meta, DomValue::Meta(meta)) => document.meta = Some(meta.clone()),
                (DomNodeType::Links, DomValue::Links(links)) => document.links = Some(links.clone()),
                (DomNodeType::Data, _) => {
                    document.data = Some(write_data(document_type, node)?);
                }
                (DomNodeType::DataCollection, _) => {
                    document.data = Some(write_data_collection(document_type, node)?);
                }
                (DomNodeType::Included, _) => {
                    let included = node
                        .children()
                        .map(write_resource)
                        .collect::<DocumentResult<Vec<_>>>()?;
                    document.included = Some(included);
                }
                (DomNodeType::Errors, DomValue::Errors(errors)) => {
                    document.errors = Some(errors.clone());
                }
                (node_type, _) => {
                    return Err(DocumentError::MalformedDocument(format!(
                        "unexpected {node_type} node under the document root"
                    )))
                }
            }
        }

        debug!(%document_type, "wrote document");
        Ok(document)
    }
}

fn write_data(document_type: DocumentType, node: DomNodeRef<'_>) -> DocumentResult<PrimaryData> {
    let child = node.children().next();
    match document_type {
        DocumentType::Resource => Ok(PrimaryData::Resource(child.map(write_resource).transpose()?)),
        DocumentType::ResourceIdentifier => Ok(PrimaryData::ResourceIdentifier(
            child.map(write_identifier).transpose()?,
        )),
        other => Err(DocumentError::MalformedDocument(format!(
            "single primary data in a {other} document"
        ))),
    }
}

fn write_data_collection(document_type: DocumentType, node: DomNodeRef<'_>) -> DocumentResult<PrimaryData> {
    match document_type {
        DocumentType::ResourceCollection => Ok(PrimaryData::ResourceCollection(
            node.children()
                .map(write_resource)
                .collect::<DocumentResult<_>>()?,
        )),
        DocumentType::ResourceIdentifierCollection => Ok(PrimaryData::ResourceIdentifierCollection(
            node.children()
                .map(write_identifier)
                .collect::<DocumentResult<_>>()?,
        )),
        other => Err(DocumentError::MalformedDocument(format!(
            "primary data collection in a {other} document"
        ))),
    }
}

fn write_resource(node: DomNodeRef<'_>) -> DocumentResult<Resource> {
    node.value()
        .as_resource()
        .map(|resource| resource.resource.clone())
        .ok_or_else(|| {
            DocumentError::MalformedDocument(format!("expected a resource node, found {}", node.node_type()))
        })
}

fn write_identifier(node: DomNodeRef<'_>) -> DocumentResult<ResourceIdentifier> {
    node.value()
        .as_resource_identifier()
        .map(|identifier| identifier.identifier.clone())
        .ok_or_else(|| {
            DocumentError::MalformedDocument(format!(
                "expected a resource identifier node, found {}",
                node.node_type()
            ))
        })
}
