//! # Nagare - Workflow Graph Compiler and Executor
//!
//! **Nagare** turns a node-based workflow graph (the kind a visual pipeline
//! editor produces) into an ordered execution plan and runs it. Nodes are
//! typed as sources, transforms or sinks; every connection is validated as
//! it is made, the graph is sorted with cycle detection, and each node kind
//! is bound to a handler before anything executes.
//!
//! ## Core Workflow
//!
//! 1.  **Build or Load a Workflow**: Use the `Workflow` mutation API directly, or implement
//!     `IntoWorkflow` for the format your editor saves.
//! 2.  **Compile**: `Compiler::builder()` creates a compiler with the built-in handlers,
//!     plus your own handlers, kind aliases and completion service. `compile` checks the
//!     graph and returns an immutable `ExecutionPlan`.
//! 3.  **Run**: `Runtime::run` executes the plan one step at a time against a set of
//!     initial inputs and returns a `RunResult` with every node's output, the sink
//!     outputs and an execution log.
//!
//! ## Quick Start
//!
//! ```rust
//! use nagare::prelude::*;
//! use ahash::AHashMap;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut workflow = Workflow::new("shout");
//! workflow.add_node(Node::source("I", "constant").with_config(Config::new().with("value", "hi")))?;
//! workflow.add_node(Node::transform("U", "uppercase"))?;
//! workflow.add_node(Node::sink("O", "collect"))?;
//! workflow.add_connection("I", "U")?;
//! workflow.add_connection("U", "O")?;
//!
//! let compiler = Compiler::builder()
//!     .with_completion_service(std::sync::Arc::new(EchoService::default()))
//!     .build();
//! let plan = compiler.compile(&workflow)?;
//!
//! let result = futures::executor::block_on(Runtime::new().run(&plan, &AHashMap::new()));
//! assert!(result.is_success());
//! assert_eq!(result.collected_output["O"], Value::text("HI"));
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod data;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod runtime;
pub mod storage;
pub mod trace;
pub mod workflow;
