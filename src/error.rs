use crate::workflow::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a prospective connection is rejected by the validator.
///
/// These are raised synchronously by [`Workflow::add_connection`](crate::workflow::Workflow::add_connection)
/// and never leave a partially applied mutation behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Node '{0}' cannot be connected to itself")]
    SelfLoop(String),

    #[error("Node '{0}' does not exist in the workflow")]
    NodeNotFound(String),

    #[error("Node '{0}' is a source and cannot receive a connection")]
    TargetIsSource(String),

    #[error("Node '{0}' is a sink and cannot originate a connection")]
    OriginIsSink(String),

    #[error("A connection from '{from}' to '{to}' already exists")]
    Duplicate { from: String, to: String },

    #[error("Direct connections from source '{from}' to sink '{to}' are not allowed")]
    SourceToSink { from: String, to: String },
}

/// Errors raised by node mutations on a workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("A node with id '{0}' already exists")]
    DuplicateNode(String),

    #[error("Node '{0}' does not exist in the workflow")]
    NodeNotFound(String),
}

/// Pre-flight errors raised while turning a workflow into an execution plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Circular dependency detected involving node '{node_id}' (cycle: {})", cycle.join(" -> "))]
    CycleDetected { node_id: String, cycle: Vec<String> },

    #[error("Node '{node_id}' of kind '{kind}' expects {expected} inbound connection(s), but has {found}")]
    Arity {
        node_id: String,
        kind: String,
        expected: String,
        found: usize,
    },

    #[error("Node '{node_id}' has an unregistered kind: '{kind}'")]
    UnknownKind { node_id: String, kind: String },

    #[error("Node '{node_id}' has an invalid configuration: {message}")]
    InvalidConfig { node_id: String, message: String },

    #[error("Connection '{connection_id}' is invalid: {source}")]
    InvalidConnection {
        connection_id: String,
        source: ConnectionError,
    },

    #[error("Node id '{0}' appears more than once in the workflow")]
    DuplicateNode(String),

    #[error("Connection id '{0}' appears more than once in the workflow")]
    DuplicateConnection(String),
}

/// Errors raised by a node handler while a plan is running.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HandlerError {
    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Completion service failed: {0}")]
    Completion(String),

    #[error("{0}")]
    Failed(String),
}

/// The cause of a failed run.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunError {
    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("Run was cancelled before the step started")]
    Cancelled,
}

/// Errors raised by a [`StateStore`](crate::storage::StateStore) backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("Failed to encode value for key '{key}': {message}")]
    Encode { key: String, message: String },

    #[error("Failed to decode value for key '{key}': {message}")]
    Decode { key: String, message: String },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Errors that can occur when converting a custom user format into a Nagare `Workflow`.
#[derive(Error, Debug, Clone)]
pub enum WorkflowConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error("Failed to rebuild the workflow graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Failed to rebuild a connection: {0}")]
    Connection(#[from] ConnectionError),
}
