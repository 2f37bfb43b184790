//! Registry of resource types.

use std::any::Any;
use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::model::error::ModelError;
use crate::model::host::HostType;
use crate::model::resource_type::{ResourceType, ResourceTypeBuilder};

/// Resolves resource type descriptors by host type and by wire type name.
#[derive(Debug)]
pub struct ServiceModel {
    resource_types: Vec<ResourceType>,
    by_host_type: HashMap<HostType, usize>,
    by_type_name: HashMap<String, usize>,
}

impl ServiceModel {
    pub fn builder() -> ServiceModelBuilder {
        ServiceModelBuilder::default()
    }

    pub fn resource_types(&self) -> &[ResourceType] {
        &self.resource_types
    }

    pub fn resolve_resource_type<T: Any>(&self) -> Result<&ResourceType, ModelError> {
        self.resolve_resource_type_of(HostType::of::<T>())
    }

    pub fn resolve_resource_type_of(&self, host_type: HostType) -> Result<&ResourceType, ModelError> {
        self.by_host_type
            .get(&host_type)
            .map(|&index| &self.resource_types[index])
            .ok_or_else(|| ModelError::UnknownHostType(host_type.name().to_string()))
    }

    pub fn resolve_resource_type_by_name(&self, type_name: &str) -> Result<&ResourceType, ModelError> {
        self.by_type_name
            .get(type_name)
            .map(|&index| &self.resource_types[index])
            .ok_or_else(|| ModelError::UnknownResourceType(type_name.to_string()))
    }
}

/// Collects resource types; [`ServiceModelBuilder::build`] validates them as a whole.
#[derive(Default)]
pub struct ServiceModelBuilder {
    pending: Vec<Result<ResourceType, ModelError>>,
}

impl ServiceModelBuilder {
    pub fn resource_type<T: Any>(mut self, builder: ResourceTypeBuilder<T>) -> Self {
        self.pending.push(builder.build());
        self
    }

    pub fn add(mut self, resource_type: ResourceType) -> Self {
        self.pending.push(Ok(resource_type));
        self
    }

    #[instrument(level = "debug", skip(self))]
    pub fn build(self) -> Result<ServiceModel, ModelError> {
        let resource_types = self.pending.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut by_host_type = HashMap::new();
        let mut by_type_name = HashMap::new();
        for (index, resource_type) in resource_types.iter().enumerate() {
            if by_host_type.insert(resource_type.host_type(), index).is_some() {
                return Err(ModelError::DuplicateResourceType(
                    resource_type.host_type().name().to_string(),
                ));
            }
            if by_type_name
                .insert(resource_type.type_name().to_string(), index)
                .is_some()
            {
                return Err(ModelError::DuplicateResourceType(resource_type.type_name().to_string()));
            }
        }

        for resource_type in &resource_types {
            for relationship in resource_type.relationships() {
                if !by_host_type.contains_key(&relationship.related()) {
                    return Err(ModelError::UnknownRelatedType {
                        resource_type: resource_type.type_name().to_string(),
                        rel: relationship.rel().to_string(),
                        related: relationship.related().name().to_string(),
                    });
                }
            }
        }

        debug!(count = resource_types.len(), "built service model");
        Ok(ServiceModel {
            resource_types,
            by_host_type,
            by_type_name,
        })
    }
}
