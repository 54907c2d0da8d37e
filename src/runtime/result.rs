use crate::error::RunError;
use crate::workflow::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Which step stopped a run, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub node_id: String,
    pub kind: String,
    pub cause: RunError,
}

/// Outcome of a single attempted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Short rendering of the produced value.
    Completed(String),
    Failed(String),
}

/// One line of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Position in the plan, starting at 0.
    pub index: usize,
    pub node_id: String,
    pub kind: String,
    pub outcome: StepOutcome,
    pub elapsed_ms: u64,
}

impl TraceEntry {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, StepOutcome::Completed(_))
    }
}

/// Everything a run produced.
///
/// Outputs are retained even when the run failed, so a host can show what
/// completed before the failing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub per_node_output: BTreeMap<String, Value>,
    /// Outputs of sink steps only.
    pub collected_output: BTreeMap<String, Value>,
    pub log: Vec<TraceEntry>,
    pub status: RunStatus,
    pub error: Option<RunFailure>,
    pub total_elapsed_ms: u64,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn output(&self, node_id: &str) -> Option<&Value> {
        self.per_node_output.get(node_id)
    }

    /// The single collected value, when the workflow has exactly one sink.
    pub fn single_output(&self) -> Option<&Value> {
        match self.collected_output.len() {
            1 => self.collected_output.values().next(),
            _ => None,
        }
    }
}
