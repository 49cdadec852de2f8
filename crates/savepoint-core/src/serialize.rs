//! Model serialization with selective field exclusion
//!
//! Converts save-capable models to and from their textual blob form.
//! Exclusion removes transient/runtime-only fields from the serialized
//! output; deserialization populates an existing instance in place (the
//! blob's fields are merged over the current state), so fields that were
//! excluded at save time keep their live values and observers holding a
//! reference to the instance keep their identity.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::domain::newtypes::SaveKey;
use crate::domain::store::SaveBlob;

/// Errors raised while converting models to or from blobs
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The model did not serialize to a JSON object
    #[error("Model does not serialize to an object; cannot apply field exclusions")]
    NotAnObject,

    /// The blob is not valid JSON, or its fields do not fit the target model
    #[error("Malformed save blob: {source}")]
    MalformedBlob {
        #[source]
        source: serde_json::Error,
    },

    /// The model itself failed to serialize
    #[error("Model serialization failed: {0}")]
    Model(#[from] serde_json::Error),
}

/// A model that can be saved and loaded by the save layer
///
/// `save_key` must be a deterministic function of the model type; it names
/// the blob locally and the file remotely. `cloud_backed` opts the model
/// into cloud mirroring on every save.
pub trait Saveable: Serialize + DeserializeOwned + 'static {
    /// Returns the stable key naming this model's persisted state
    fn save_key(&self) -> SaveKey;

    /// Whether saves of this model are mirrored to the cloud backend
    fn cloud_backed(&self) -> bool {
        false
    }

    /// Top-level field names omitted from the serialized form
    fn excluded_fields(&self) -> &[&str] {
        &[]
    }
}

/// Per-type registry of excluded field names
///
/// Configured once per model type before the first serialization of an
/// instance of that type. Exclusions from the registry are unioned with the
/// model's own [`Saveable::excluded_fields`].
#[derive(Debug, Default)]
pub struct FieldExclusions {
    by_type: HashMap<TypeId, HashSet<String>>,
}

impl FieldExclusions {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers excluded field names for model type `T`
    pub fn exclude<T: 'static>(&mut self, fields: &[&str]) {
        let entry = self.by_type.entry(TypeId::of::<T>()).or_default();
        for field in fields {
            entry.insert((*field).to_string());
        }
    }

    /// Returns the registered exclusions for model type `T`, if any
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&HashSet<String>> {
        self.by_type.get(&TypeId::of::<T>())
    }
}

/// Exclusion-aware converter between models and blobs
#[derive(Debug, Default)]
pub struct Serializer {
    exclusions: FieldExclusions,
}

impl Serializer {
    /// Creates a serializer with no registered exclusions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a serializer with a pre-populated exclusion registry
    #[must_use]
    pub fn with_exclusions(exclusions: FieldExclusions) -> Self {
        Self { exclusions }
    }

    /// Registers excluded field names for model type `T`
    pub fn exclude<T: 'static>(&mut self, fields: &[&str]) {
        self.exclusions.exclude::<T>(fields);
    }

    /// Serializes `model` to its blob form, omitting excluded fields
    pub fn serialize<T: Saveable>(&self, model: &T) -> Result<SaveBlob, SerializeError> {
        let mut value = serde_json::to_value(model)?;
        let object = value.as_object_mut().ok_or(SerializeError::NotAnObject)?;

        for field in model.excluded_fields() {
            object.remove(*field);
        }
        if let Some(registered) = self.exclusions.get::<T>() {
            for field in registered {
                object.remove(field);
            }
        }

        trace!(key = %model.save_key(), fields = object.len(), "Serialized model");
        Ok(SaveBlob::new(value.to_string()))
    }

    /// Populates `target` in place from `blob`.
    ///
    /// The blob's top-level fields are merged over the target's current
    /// serialized state, so fields absent from the blob keep their live
    /// values. The merged value is then written back through the mutable
    /// reference; the instance itself is never replaced by a new allocation
    /// visible to the caller.
    pub fn deserialize<T: Saveable>(
        &self,
        blob: &SaveBlob,
        target: &mut T,
    ) -> Result<(), SerializeError> {
        let loaded: Value = serde_json::from_str(blob.as_str())
            .map_err(|source| SerializeError::MalformedBlob { source })?;
        let loaded_object = match loaded {
            Value::Object(map) => map,
            _ => return Err(SerializeError::NotAnObject),
        };

        let mut current = serde_json::to_value(&*target)?;
        let current_object = current.as_object_mut().ok_or(SerializeError::NotAnObject)?;
        for (field, value) in loaded_object {
            current_object.insert(field, value);
        }

        *target = serde_json::from_value(current)
            .map_err(|source| SerializeError::MalformedBlob { source })?;
        Ok(())
    }
}
