use std::any::{self, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime key of a host type.
///
/// Equality and hashing use the `TypeId` only; the name is for messages.
#[derive(Clone, Copy)]
pub struct HostType {
    id: TypeId,
    name: &'static str,
}

impl HostType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for HostType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HostType {}

impl Hash for HostType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An owned, type-erased host object together with its host type.
pub struct HostResource {
    host_type: HostType,
    value: Box<dyn Any>,
}

impl HostResource {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            host_type: HostType::of::<T>(),
            value: Box::new(value),
        }
    }

    pub(crate) fn from_boxed(host_type: HostType, value: Box<dyn Any>) -> Self {
        Self { host_type, value }
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let host_type = self.host_type;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { host_type, value }),
        }
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut *self.value
    }
}

impl fmt::Debug for HostResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostResource")
            .field("host_type", &self.host_type)
            .finish_non_exhaustive()
    }
}
