//! Lowers a workflow snapshot into an [`ExecutionPlan`].

use crate::error::CompileError;
use crate::handler::{CompletionService, HandlerRegistry, InvokeModelHandler, NodeHandler, kinds};
use crate::workflow::Workflow;
use ahash::AHashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub mod ordering;
mod plan;

pub use ordering::topological_order;
pub use plan::{ExecutionPlan, Step};

/// Turns workflows into execution plans against a fixed set of handlers.
///
/// A compiler is reusable: `compile` borrows the workflow and never mutates
/// it, so the same compiler can serve every run.
#[derive(Debug, Clone)]
pub struct Compiler {
    registry: HandlerRegistry,
}

pub struct CompilerBuilder {
    registry: HandlerRegistry,
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerBuilder {
    /// Starts from the built-in handlers.
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::with_defaults(),
        }
    }

    /// Starts from an empty registry.
    pub fn empty() -> Self {
        Self {
            registry: HandlerRegistry::new(),
        }
    }

    /// Registers (or replaces) the handler for `kind`.
    pub fn with_handler(mut self, kind: &str, handler: Arc<dyn NodeHandler>) -> Self {
        self.registry.register(kind, handler);
        self
    }

    /// Lets a host-specific kind name resolve to an already known kind.
    pub fn with_kind_alias(mut self, user_kind: &str, nagare_kind: &str) -> Self {
        self.registry.alias(user_kind, nagare_kind);
        self
    }

    /// Enables the `invoke-model` kind backed by `service`.
    pub fn with_completion_service(self, service: Arc<dyn CompletionService>) -> Self {
        self.with_handler(
            kinds::INVOKE_MODEL,
            Arc::new(InvokeModelHandler::new(service)),
        )
    }

    pub fn build(self) -> Compiler {
        Compiler {
            registry: self.registry,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        CompilerBuilder::new().build()
    }
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Compiles a workflow snapshot.
    ///
    /// Checks integrity, orders the nodes, then resolves each node's
    /// producers, handler, arity and config. Nothing is executed.
    pub fn compile(&self, workflow: &Workflow) -> Result<ExecutionPlan, CompileError> {
        workflow.check_integrity()?;
        let order = topological_order(workflow)?;

        let mut inbound: AHashMap<&str, Vec<String>> = AHashMap::new();
        for connection in workflow.connections() {
            inbound
                .entry(connection.to.as_str())
                .or_default()
                .push(connection.from.clone());
        }

        let mut steps = Vec::with_capacity(order.len());
        let mut handlers: AHashMap<String, Arc<dyn NodeHandler>> = AHashMap::new();

        for node_id in order {
            let Some(node) = workflow.node(&node_id) else {
                continue;
            };
            let (handler_kind, handler) =
                self.registry
                    .resolve(&node.kind)
                    .ok_or_else(|| CompileError::UnknownKind {
                        node_id: node_id.clone(),
                        kind: node.kind.clone(),
                    })?;

            let inbound_node_ids = inbound.remove(node_id.as_str()).unwrap_or_default();
            let arity = handler.arity();
            if !arity.accepts(inbound_node_ids.len()) {
                return Err(CompileError::Arity {
                    node_id,
                    kind: node.kind.clone(),
                    expected: arity.to_string(),
                    found: inbound_node_ids.len(),
                });
            }

            handler
                .validate(&node.config)
                .map_err(|message| CompileError::InvalidConfig {
                    node_id: node_id.clone(),
                    message,
                })?;

            debug!(node_id = %node_id, kind = %node.kind, inbound = inbound_node_ids.len(), "Planned step");
            handlers
                .entry(handler_kind.to_string())
                .or_insert_with(|| Arc::clone(handler));
            steps.push(Step {
                node_id,
                role: node.role(),
                kind: node.kind.clone(),
                handler_kind: handler_kind.to_string(),
                inbound_node_ids,
                config: node.config.clone(),
            });
        }

        info!(
            workflow = %workflow.name,
            steps = steps.len(),
            connections = workflow.connections().len(),
            "Compiled workflow"
        );
        Ok(ExecutionPlan::new(steps, handlers))
    }
}
