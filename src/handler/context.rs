//! Per-request scratch state threaded through every pipeline stage.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Mutable state owned by a single in-flight dispatch.
///
/// `path_params` is written by the pipeline right after route resolution.
/// Everything else lives in `data`, a free-form bag hooks and handlers use to
/// hand values to whatever runs after them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Parameters captured by the resolver for the matched route.
    pub path_params: HashMap<String, String>,
    /// Values attached by hooks and handlers.
    pub data: HashMap<String, Value>,
}

impl RequestContext {
    /// Create an empty request context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value before dispatch.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Get a captured path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Attach a value, returning the previous one for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Attach any serializable value.
    pub fn set_json<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Option<Value>, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        Ok(self.data.insert(key.into(), value))
    }

    /// Get an attached value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get an attached string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Deserialize an attached value into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T, serde_json::Error>> {
        self.data
            .get(key)
            .map(|value| T::deserialize(value))
    }

    /// Check whether a value is attached.
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Detach a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }
}
