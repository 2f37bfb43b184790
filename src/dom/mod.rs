//! JSON:API shaped document tree.
//!
//! A [`DomDocument`] is assembled either from host objects ([`DomDocument::build`])
//! or from a wire [`Document`] ([`DomDocument::parse`]), both driven by a
//! [`ServiceModel`]. It is read through a [`DocumentReader`] and turned back
//! into a wire document by a [`DocumentWriter`].

pub mod assembly;
pub mod error;
pub mod node;
pub mod reader;
pub mod writer;

use std::any::Any;

use termtree::Tree as TermTree;
use tracing::instrument;

use crate::config::Settings;
use crate::document::{Document, DocumentType, ErrorObject, JsonApiVersion, Links, Meta};
use crate::domain::TreeNodeConvert;
use crate::model::{HostResource, ServiceModel};

use assembly::DomAssembler;
pub use error::{DocumentError, DocumentResult};
pub use node::{DomNodeType, DomResource, DomResourceIdentifier, DomTree, DomValue};
pub use reader::DocumentReader;
pub use writer::DocumentWriter;

/// Primary data of a host document.
#[derive(Debug, Default)]
pub enum HostData {
    #[default]
    None,
    Resource(Option<HostResource>),
    ResourceCollection(Vec<HostResource>),
    ResourceIdentifier(Option<HostResource>),
    ResourceIdentifierCollection(Vec<HostResource>),
    Errors(Vec<ErrorObject>),
}

impl HostData {
    pub fn document_type(&self) -> DocumentType {
        match self {
            HostData::None => DocumentType::Document,
            HostData::Resource(_) => DocumentType::Resource,
            HostData::ResourceCollection(_) => DocumentType::ResourceCollection,
            HostData::ResourceIdentifier(_) => DocumentType::ResourceIdentifier,
            HostData::ResourceIdentifierCollection(_) => DocumentType::ResourceIdentifierCollection,
            HostData::Errors(_) => DocumentType::Errors,
        }
    }
}

/// A document expressed in host objects, the input of [`DomDocument::build`].
#[derive(Debug, Default)]
pub struct HostDocument {
    pub jsonapi: Option<JsonApiVersion>,
    pub meta: Option<Meta>,
    pub links: Option<Links>,
    pub data: HostData,
    pub included: Vec<HostResource>,
}

impl HostDocument {
    pub fn resource<T: Any>(resource: T) -> Self {
        Self {
            data: HostData::Resource(Some(HostResource::new(resource))),
            ..Self::default()
        }
    }

    pub fn resource_collection<T: Any>(resources: impl IntoIterator<Item = T>) -> Self {
        Self {
            data: HostData::ResourceCollection(resources.into_iter().map(HostResource::new).collect()),
            ..Self::default()
        }
    }

    pub fn resource_identifier<T: Any>(resource: T) -> Self {
        Self {
            data: HostData::ResourceIdentifier(Some(HostResource::new(resource))),
            ..Self::default()
        }
    }

    pub fn resource_identifier_collection<T: Any>(resources: impl IntoIterator<Item = T>) -> Self {
        Self {
            data: HostData::ResourceIdentifierCollection(
                resources.into_iter().map(HostResource::new).collect(),
            ),
            ..Self::default()
        }
    }

    pub fn errors(errors: Vec<ErrorObject>) -> Self {
        Self {
            data: HostData::Errors(errors),
            ..Self::default()
        }
    }

    pub fn with_included<T: Any>(mut self, resource: T) -> Self {
        self.included.push(HostResource::new(resource));
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_jsonapi(mut self, jsonapi: JsonApiVersion) -> Self {
        self.jsonapi = Some(jsonapi);
        self
    }
}

/// An assembled document tree.
#[derive(Debug)]
pub struct DomDocument {
    tree: DomTree,
    settings: Settings,
}

impl DomDocument {
    /// Projects host objects into a document tree.
    #[instrument(level = "debug", skip_all, fields(document_type = %host.data.document_type()))]
    pub fn build(model: &ServiceModel, host: HostDocument, settings: &Settings) -> DocumentResult<Self> {
        let document_type = host.data.document_type();
        let tree = DomAssembler::new(model, settings, document_type).build(host)?;
        Ok(Self {
            tree,
            settings: settings.clone(),
        })
    }

    /// Materializes host objects from a wire document.
    ///
    /// The document type is taken from the wire shape. A resource object
    /// carrying only `type`, `id` and `meta` is indistinguishable from a
    /// resource identifier and reads back as one; use
    /// [`DomDocument::parse_as`] when the expected shape is known.
    #[instrument(level = "debug", skip_all, fields(document_type = %document.document_type()))]
    pub fn parse(model: &ServiceModel, document: &Document, settings: &Settings) -> DocumentResult<Self> {
        let tree = DomAssembler::new(model, settings, document.document_type()).parse(document)?;
        Ok(Self {
            tree,
            settings: settings.clone(),
        })
    }

    /// Like [`DomDocument::parse`], reading the primary data as `document_type`.
    ///
    /// Fails with [`DocumentError::DocumentTypeMismatch`] if the wire data
    /// cannot take that shape.
    #[instrument(level = "debug", skip(model, document, settings))]
    pub fn parse_as(
        model: &ServiceModel,
        document: &Document,
        document_type: DocumentType,
        settings: &Settings,
    ) -> DocumentResult<Self> {
        let actual = document.document_type();
        if actual == document_type {
            return Self::parse(model, document, settings);
        }
        let data = document
            .data
            .clone()
            .filter(|_| document.errors.is_none())
            .and_then(|data| data.reinterpret(document_type))
            .ok_or_else(|| DocumentError::DocumentTypeMismatch {
                document_type: actual,
                requested: document_type.to_string(),
            })?;
        let document = Document {
            data: Some(data),
            ..document.clone()
        };
        Self::parse(model, &document, settings)
    }

    /// Parses JSON text and assembles it, see [`DomDocument::parse`].
    pub fn from_json(model: &ServiceModel, json: &str, settings: &Settings) -> DocumentResult<Self> {
        let document = Document::from_json(json)?;
        Self::parse(model, &document, settings)
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shape of the document, as recorded on the root node.
    pub fn document_type(&self) -> DocumentType {
        match self.tree.node(self.tree.root()).map(|root| root.value()) {
            Ok(DomValue::Document(document_type)) => *document_type,
            _ => DocumentType::Document,
        }
    }

    pub fn reader(&self) -> DocumentReader<'_> {
        DocumentReader::new(self)
    }

    pub fn write(&self) -> DocumentResult<Document> {
        DocumentWriter::new(self).write_document()
    }
}

impl TreeNodeConvert for DomDocument {
    fn to_tree_string(&self) -> TermTree<String> {
        self.tree.to_tree_string()
    }
}
