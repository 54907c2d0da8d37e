use crate::handler::NodeHandler;
use crate::workflow::{Config, Role};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One compiled node, with its producers resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub node_id: String,
    pub role: Role,
    /// The kind exactly as declared on the node.
    pub kind: String,
    /// The registered kind the declared one resolved to (differs for aliases).
    pub handler_kind: String,
    /// Producers in connection creation order.
    pub inbound_node_ids: Vec<String>,
    pub config: Config,
}

/// The compiled, ordered form of a workflow snapshot.
///
/// A plan owns copies of all node data and the handlers it needs, so it stays
/// valid however the source workflow is edited afterwards.
#[derive(Clone)]
pub struct ExecutionPlan {
    steps: Vec<Step>,
    handlers: AHashMap<String, Arc<dyn NodeHandler>>,
}

impl ExecutionPlan {
    pub(crate) fn new(steps: Vec<Step>, handlers: AHashMap<String, Arc<dyn NodeHandler>>) -> Self {
        Self { steps, handlers }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, node_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.node_id == node_id)
    }

    /// Node ids in execution order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.node_id.as_str())
    }

    pub fn handler(&self, step: &Step) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(&step.handler_kind)
    }
}

impl fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ExecutionPlan {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "{:>3}. {} [{} {}]", i + 1, step.node_id, step.role, step.kind)?;
            if !step.inbound_node_ids.is_empty() {
                write!(f, " <- {}", step.inbound_node_ids.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
