//! Service model: how host types map to wire resources.

pub mod conversion;
pub mod error;
pub mod host;
pub mod resource_type;
pub mod service_model;

pub use crate::document::Cardinality;
pub use conversion::ResourceId;
pub use error::{ConversionError, ModelError};
pub use host::{HostResource, HostType};
pub use resource_type::{
    AttributeDescriptor, HostLinkage, RelationshipDescriptor, ResourceType, ResourceTypeBuilder,
};
pub use service_model::{ServiceModel, ServiceModelBuilder};
