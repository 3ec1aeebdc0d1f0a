//! Storable Object Module
//!
//! Defines the contract for records that can be cached: a JSON body plus
//! fields the key derivation reads.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

// == Storable Object ==
/// A typed record whose fields drive cache-key derivation and whose body is
/// serialized as the cache payload.
///
/// The cache never constructs entities; callers own them and the cache only
/// reads fields and encodes or decodes bodies.
pub trait StorableObject: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human readable name used in error messages.
    fn entity_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Encodes the entity body as JSON.
    fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Populates this instance from a JSON body.
    ///
    /// The default replaces every field. On a decode error the instance is
    /// left untouched.
    fn import_json(&mut self, json: &str) -> Result<()> {
        *self = serde_json::from_str(json)?;
        Ok(())
    }
}

// == Default Value ==
/// Answers whether a field still holds its default, unset value.
pub trait DefaultValue {
    fn is_default_value(&self) -> bool;
}

impl<T: Default + PartialEq> DefaultValue for T {
    fn is_default_value(&self) -> bool {
        *self == T::default()
    }
}
