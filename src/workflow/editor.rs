//! The JSON document a visual workflow editor saves and exports.
//!
//! ```json
//! {
//!   "name": "summarize",
//!   "nodes": [
//!     { "id": "in", "type": "input", "data": { "defaultValue": "hello" } },
//!     { "id": "out", "type": "output", "data": { "outputFormat": "text" } }
//!   ],
//!   "connections": [ { "id": "conn-1", "from": "in", "to": "out" } ]
//! }
//! ```
//!
//! Editor data keys are camelCase and some carry editor-specific names
//! (`mergeType`, `sortOrder`, ...). They are normalized into the config keys
//! the built-in handlers read.

use super::conversion::IntoWorkflow;
use super::definition::{Connection, Node, Role, Workflow};
use super::value::{Config, Value};
use crate::error::WorkflowConversionError;
use serde::{Deserialize, Serialize};

/// Editor data keys (after snake-casing) that map to a different config key.
const KEY_RENAMES: [(&str, &str); 12] = [
    ("default_value", "default"),
    ("merge_type", "strategy"),
    ("sort_type", "by"),
    ("sort_order", "order"),
    ("split_type", "mode"),
    ("aggregate_type", "op"),
    ("transform_type", "op"),
    ("output_format", "format"),
    ("filter_type", "condition"),
    ("filter_value", "value"),
    ("true_output", "true_label"),
    ("false_output", "false_label"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorWorkflow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub nodes: Vec<EditorNode>,
    #[serde(default)]
    pub connections: Vec<EditorConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Overrides the role inferred from `type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConnection {
    pub id: String,
    pub from: String,
    pub to: String,
}

impl EditorWorkflow {
    pub fn from_json(content: &str) -> Result<Self, WorkflowConversionError> {
        serde_json::from_str(content)
            .map_err(|e| WorkflowConversionError::ValidationError(format!("invalid workflow JSON: {}", e)))
    }

    pub fn to_json_pretty(&self) -> Result<String, WorkflowConversionError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WorkflowConversionError::ValidationError(e.to_string()))
    }
}

/// Role the editor implies for a node type.
pub fn infer_role(kind: &str) -> Role {
    match kind {
        "input" | "constant" | "constant-input" => Role::Source,
        "output" | "collect" | "collect-output" => Role::Sink,
        _ => Role::Transform,
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn config_key(key: &str) -> String {
    let key = snake_case(key);
    KEY_RENAMES
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| to.to_string())
        .unwrap_or(key)
}

impl IntoWorkflow for EditorWorkflow {
    fn into_workflow(self) -> Result<Workflow, WorkflowConversionError> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|raw| {
                let role = raw.role.unwrap_or_else(|| infer_role(&raw.kind));
                let config: Config = raw
                    .data
                    .into_iter()
                    .map(|(k, v)| (config_key(&k), Value::from(v)))
                    .collect();
                Node::new(raw.id, role, raw.kind).with_config(config)
            })
            .collect();

        let connections = self
            .connections
            .into_iter()
            .map(|raw| Connection {
                id: raw.id,
                from: raw.from,
                to: raw.to,
            })
            .collect();

        let mut workflow = Workflow::from_parts(self.name, nodes, connections);
        workflow.description = self.description;
        workflow
            .check_integrity()
            .map_err(|e| WorkflowConversionError::ValidationError(e.to_string()))?;
        Ok(workflow)
    }
}

impl From<&Workflow> for EditorWorkflow {
    fn from(workflow: &Workflow) -> Self {
        Self {
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            version: Some("1.0".to_string()),
            nodes: workflow
                .nodes()
                .iter()
                .map(|node| EditorNode {
                    id: node.id().to_string(),
                    kind: node.kind.clone(),
                    role: (infer_role(&node.kind) != node.role()).then_some(node.role()),
                    data: node
                        .config
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                })
                .collect(),
            connections: workflow
                .connections()
                .iter()
                .map(|c| EditorConnection {
                    id: c.id.clone(),
                    from: c.from.clone(),
                    to: c.to.clone(),
                })
                .collect(),
        }
    }
}
