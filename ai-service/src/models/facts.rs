//! Host-supplied property facts and the request/response bodies built on them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys of `host_input_facts` that feed the prompt.
pub const FACT_KEYS: [&str; 5] = [
    "location",
    "amenities",
    "vibe",
    "capacity",
    "additional_details",
];

#[derive(Debug, Deserialize)]
pub struct GenerateDescriptionRequest {
    pub host_input_facts: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateDescriptionResponse {
    pub description: String,
}

/// Normalized property facts. Every field is trimmed; an empty string means
/// the host did not provide it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    pub location: String,
    pub amenities: String,
    pub vibe: String,
    pub capacity: String,
    pub additional_details: String,
}

impl FactSet {
    /// Normalize the raw `host_input_facts` object. Missing keys and `null`
    /// become empty strings, other scalars use their JSON text.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let field = |key: &str| raw.get(key).map(coerce).unwrap_or_default();

        Self {
            location: field("location"),
            amenities: field("amenities"),
            vibe: field("vibe"),
            capacity: field("capacity"),
            additional_details: field("additional_details"),
        }
    }

    /// Keys present in the raw input that the prompt does not use.
    pub fn ignored_keys(raw: &Map<String, Value>) -> Vec<&str> {
        raw.keys()
            .map(String::as_str)
            .filter(|k| !FACT_KEYS.contains(k))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
            && self.amenities.is_empty()
            && self.vibe.is_empty()
            && self.capacity.is_empty()
            && self.additional_details.is_empty()
    }
}

fn coerce(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        // Hosts sometimes send amenities as a list.
        Value::Array(items) => items
            .iter()
            .map(coerce)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}
