//! Sequential execution of compiled plans.

use crate::compiler::{ExecutionPlan, Step};
use crate::error::{HandlerError, RunError};
use crate::workflow::{Role, Value};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

mod result;

pub use result::{RunFailure, RunResult, RunStatus, StepOutcome, TraceEntry};

/// Longest value rendering kept in a trace entry.
const SUMMARY_LIMIT: usize = 80;

/// Runs plans one step at a time, in plan order.
///
/// Each handler future is awaited before the next step starts. The first
/// handler failure stops the run.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    cancellation: Option<CancellationToken>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `token` before each step. A cancelled run fails at the step
    /// that was about to start.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Executes `plan`, feeding `initial_inputs` to source steps.
    ///
    /// A source step reads the input named by its `name` config entry, or by
    /// its node id, and receives it as its single inbound value.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        initial_inputs: &AHashMap<String, Value>,
    ) -> RunResult {
        let started = Instant::now();
        let mut per_node_output: BTreeMap<String, Value> = BTreeMap::new();
        let mut log = Vec::with_capacity(plan.len());
        let mut failure = None;

        info!(steps = plan.len(), "Starting run");

        for (index, step) in plan.steps().iter().enumerate() {
            let step_start = Instant::now();
            let outcome = if self.is_cancelled() {
                Err(RunError::Cancelled)
            } else {
                debug!(node_id = %step.node_id, kind = %step.kind, "Executing step");
                let inbound = gather_inbound(step, &per_node_output, initial_inputs);
                match plan.handler(step) {
                    Some(handler) => handler
                        .invoke(inbound, &step.config)
                        .await
                        .map_err(RunError::from),
                    None => Err(RunError::Handler(HandlerError::Failed(format!(
                        "no handler bound for kind '{}'",
                        step.handler_kind
                    )))),
                }
            };
            let elapsed_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(value) => {
                    debug!(node_id = %step.node_id, elapsed_ms, "Step complete");
                    log.push(TraceEntry {
                        index,
                        node_id: step.node_id.clone(),
                        kind: step.kind.clone(),
                        outcome: StepOutcome::Completed(summarize(&value)),
                        elapsed_ms,
                    });
                    per_node_output.insert(step.node_id.clone(), value);
                }
                Err(cause) => {
                    error!(node_id = %step.node_id, kind = %step.kind, error = %cause, "Step failed");
                    log.push(TraceEntry {
                        index,
                        node_id: step.node_id.clone(),
                        kind: step.kind.clone(),
                        outcome: StepOutcome::Failed(cause.to_string()),
                        elapsed_ms,
                    });
                    failure = Some(RunFailure {
                        node_id: step.node_id.clone(),
                        kind: step.kind.clone(),
                        cause,
                    });
                    break;
                }
            }
        }

        // A failed run has no collected output, even for sinks that ran.
        let collected_output: BTreeMap<String, Value> = match failure {
            Some(_) => BTreeMap::new(),
            None => plan
                .steps()
                .iter()
                .filter(|step| step.role == Role::Sink)
                .filter_map(|step| {
                    per_node_output
                        .get(&step.node_id)
                        .map(|value| (step.node_id.clone(), value.clone()))
                })
                .collect(),
        };

        let status = if failure.is_none() {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };
        let total_elapsed_ms = started.elapsed().as_millis() as u64;
        info!(?status, executed = log.len(), total_elapsed_ms, "Run finished");

        RunResult {
            per_node_output,
            collected_output,
            log,
            status,
            error: failure,
            total_elapsed_ms,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

fn gather_inbound(
    step: &Step,
    outputs: &BTreeMap<String, Value>,
    initial_inputs: &AHashMap<String, Value>,
) -> Vec<Value> {
    if step.role == Role::Source && step.inbound_node_ids.is_empty() {
        let key = step.config.get_str("name").unwrap_or(&step.node_id);
        return initial_inputs.get(key).cloned().into_iter().collect();
    }
    step.inbound_node_ids
        .iter()
        .map(|id| outputs.get(id).cloned().unwrap_or_default())
        .collect()
}

fn summarize(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= SUMMARY_LIMIT {
        return text;
    }
    let mut short: String = text.chars().take(SUMMARY_LIMIT).collect();
    short.push_str("...");
    short
}
