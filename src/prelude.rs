//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the nagare crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use nagare::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let inputs = RunInputs::from_file("path/to/inputs.json")?;
//! let store = FileStore::open("state")?;
//! let workflow = load_workflow(&store, "draft")?.ok_or("no saved workflow")?;
//!
//! let plan = Compiler::default().compile(&workflow)?;
//! let result = Runtime::new().run(&plan, &inputs.to_map()).await;
//! println!("{}", TraceFormatter::format_run(&result));
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::workflow::{
    Config, Connection, ConnectionRules, IntoWorkflow, Node, Role, Value, Workflow,
    WorkflowHistory,
};

// Compilation and execution
pub use crate::compiler::{Compiler, CompilerBuilder, ExecutionPlan, Step};
pub use crate::runtime::{RunResult, RunStatus, Runtime};

// Handlers
pub use crate::handler::{
    Arity, CompletionRequest, CompletionService, EchoService, FnHandler, HandlerRegistry,
    NodeHandler,
};

// Data and persistence
pub use crate::data::RunInputs;
pub use crate::storage::{FileStore, MemoryStore, StateStore, load_workflow, save_workflow};

// Error types
pub use crate::error::{CompileError, ConnectionError, GraphError, HandlerError, RunError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
