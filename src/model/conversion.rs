//! Conversion between host values and their wire representation.
//!
//! Identifiers travel as strings on the wire; attribute values travel as
//! JSON values and convert through `serde`.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::model::error::ConversionError;

/// A host identifier type with a string wire form.
pub trait ResourceId: Clone + PartialEq + Debug + 'static {
    fn to_wire_id(&self) -> String;

    fn from_wire_id(value: &str) -> Result<Self, ConversionError>;
}

impl ResourceId for String {
    fn to_wire_id(&self) -> String {
        self.clone()
    }

    fn from_wire_id(value: &str) -> Result<Self, ConversionError> {
        Ok(value.to_string())
    }
}

impl ResourceId for Uuid {
    fn to_wire_id(&self) -> String {
        self.hyphenated().to_string()
    }

    fn from_wire_id(value: &str) -> Result<Self, ConversionError> {
        Uuid::parse_str(value).map_err(|e| ConversionError::Identifier {
            value: value.to_string(),
            target: "Uuid",
            reason: e.to_string(),
        })
    }
}

macro_rules! integer_resource_id {
    ($($ty:ty),*) => {
        $(
            impl ResourceId for $ty {
                fn to_wire_id(&self) -> String {
                    self.to_string()
                }

                fn from_wire_id(value: &str) -> Result<Self, ConversionError> {
                    value.parse::<$ty>().map_err(|e| ConversionError::Identifier {
                        value: value.to_string(),
                        target: stringify!($ty),
                        reason: e.to_string(),
                    })
                }
            }
        )*
    };
}

integer_resource_id!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

pub fn to_wire_value<A: Serialize>(name: &str, value: &A) -> Result<Value, ConversionError> {
    serde_json::to_value(value).map_err(|source| ConversionError::Attribute {
        name: name.to_string(),
        source,
    })
}

pub fn from_wire_value<A: DeserializeOwned>(name: &str, value: Value) -> Result<A, ConversionError> {
    serde_json::from_value(value).map_err(|source| ConversionError::Attribute {
        name: name.to_string(),
        source,
    })
}
