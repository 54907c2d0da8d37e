use crate::workflow::Value;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Initial inputs for a run, keyed by source name (or source node id).
///
/// The JSON form is a flat object: `{ "topic": "rust", "limit": 3 }`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "BTreeMap<String, serde_json::Value>", into = "BTreeMap<String, serde_json::Value>")]
pub struct RunInputs {
    values: BTreeMap<String, Value>,
}

impl RunInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load inputs from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let data = serde_json::from_str(content)?;
        Ok(data)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The lookup map the runtime takes.
    pub fn to_map(&self) -> AHashMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for RunInputs {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            values: raw.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }
}

impl From<RunInputs> for BTreeMap<String, serde_json::Value> {
    fn from(inputs: RunInputs) -> Self {
        inputs
            .values
            .into_iter()
            .map(|(k, v)| (k, v.to_json()))
            .collect()
    }
}
