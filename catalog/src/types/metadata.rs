use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque structured document attached to association rows.
///
/// The catalog never looks inside the document; it is stored and returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Value);

impl Metadata {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Builds the stored document from a descriptor's metadata map.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self(Value::Object(map.clone()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for Metadata {
    /// An empty JSON object.
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl From<Value> for Metadata {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
