//! Document object model for JSON:API documents.
//!
//! Layers, leaf first:
//! - [`domain`]: generic arena tree of tagged nodes with attributes and visitors
//! - [`model`]: service model mapping host types to wire resources
//! - [`document`]: the wire document record
//! - [`dom`]: the JSON:API shaped tree, its assembly, reader and writer
//! - [`config`]: layered settings

pub mod config;
pub mod document;
pub mod dom;
pub mod domain;
pub mod model;
pub mod util;

pub use config::{RelatedOrder, Settings};
pub use document::Document;
pub use dom::{
    DocumentError, DocumentReader, DocumentResult, DocumentWriter, DomDocument, HostData,
    HostDocument,
};
pub use model::{ResourceType, ServiceModel};
