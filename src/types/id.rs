// ABOUTME: Phantom-typed resource names for compile-time type safety.
// ABOUTME: Prevents passing a model name where an endpoint configuration name is expected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::endpoint_name::{EndpointName, EndpointNameError};

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum EndpointConfigMarker {}
pub enum ModelMarker {}

/// A type-safe resource name that prevents accidental mixing of resource kinds.
///
/// Endpoint configurations and models share the endpoint naming rules, so the
/// value is always a valid SageMaker resource name.
#[must_use = "names reference cloud resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Validate and wrap a resource name.
    pub fn new(value: impl Into<String>) -> Result<Self, EndpointNameError> {
        let value = value.into();
        EndpointName::validate(&value)?;
        Ok(Self::from_valid(value))
    }

    /// Name a resource after its endpoint.
    pub fn for_endpoint(endpoint: &EndpointName) -> Self {
        Self::from_valid(endpoint.as_str().to_string())
    }

    /// Name a resource after its endpoint plus a suffix, truncated to fit.
    pub fn derived(endpoint: &EndpointName, suffix: &str) -> Self {
        Self::from_valid(endpoint.derived(suffix))
    }

    fn from_valid(value: String) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only used as a phantom type marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_valid(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

pub type EndpointConfigName = Id<EndpointConfigMarker>;
pub type ModelName = Id<ModelMarker>;
