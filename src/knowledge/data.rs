// src/knowledge/data.rs
//
// The node schema catalogue's shape and its embedded fixture. Production
// data loading is out of scope (spec §1); this module defines the query
// surface over a small in-repo fixture used by tests, with an
// `include_str!`-loadable JSON asset hook for a real deployment to swap in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const EMBEDDED_CATALOGUE_JSON: &str = include_str!("catalogue.json");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceOperationSchema {
    pub resources: Vec<String>,
    pub operations: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PropertySchema {
    pub name: String,
    pub required: bool,
    #[serde(default)]
    pub show: Option<HashMap<String, Vec<Value>>>,
    #[serde(default, rename = "enumOptions")]
    pub enum_options: Option<Vec<String>>,
    #[serde(default, rename = "propertyType")]
    pub property_type: Option<String>,
}

impl PropertySchema {
    /// A condition is satisfied when every other-property named in `show`
    /// is currently one of its permitted values.
    pub fn is_visible(&self, current_values: &HashMap<String, Value>) -> bool {
        match &self.show {
            None => true,
            Some(predicate) => predicate.iter().all(|(other_key, permitted)| {
                current_values
                    .get(other_key)
                    .map(|v| permitted.contains(v))
                    .unwrap_or(false)
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeSchema {
    #[serde(rename = "nodeType")]
    pub node_type: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub source: String,
    pub properties: Vec<PropertySchema>,
    #[serde(default, rename = "resourceOperations")]
    pub resource_operations: Option<ResourceOperationSchema>,
}

pub fn load_embedded_catalogue() -> Vec<NodeSchema> {
    serde_json::from_str(EMBEDDED_CATALOGUE_JSON).expect("embedded catalogue fixture is valid JSON")
}

pub fn load_catalogue_from_str(data: &str) -> Result<Vec<NodeSchema>, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_fixture_parses() {
        let catalogue = load_embedded_catalogue();
        assert!(!catalogue.is_empty());
        assert!(catalogue.iter().any(|n| n.node_type == "httpRequest"));
    }
}
