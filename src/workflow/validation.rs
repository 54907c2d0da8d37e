use super::definition::{Role, Workflow};
use crate::error::ConnectionError;
use serde::{Deserialize, Serialize};

/// Optional connection rules layered on top of the structural ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionRules {
    /// Rejects edges that go straight from a source node to a sink node.
    pub forbid_source_to_sink: bool,
}

impl ConnectionRules {
    /// Rules that also reject direct source-to-sink edges.
    pub fn strict() -> Self {
        Self {
            forbid_source_to_sink: true,
        }
    }
}

/// Returns `true` if a connection `from -> to` may be added to `workflow`.
pub fn is_legal(workflow: &Workflow, from: &str, to: &str) -> bool {
    check_connection(workflow, from, to).is_ok()
}

/// Checks a prospective connection and explains the first rule it breaks.
///
/// Cheap checks run first. The rules are independent, so the order only
/// decides which error is reported when several apply.
pub fn check_connection(workflow: &Workflow, from: &str, to: &str) -> Result<(), ConnectionError> {
    if from == to {
        return Err(ConnectionError::SelfLoop(from.to_string()));
    }

    let origin = workflow
        .node(from)
        .ok_or_else(|| ConnectionError::NodeNotFound(from.to_string()))?;
    let target = workflow
        .node(to)
        .ok_or_else(|| ConnectionError::NodeNotFound(to.to_string()))?;

    if target.role() == Role::Source {
        return Err(ConnectionError::TargetIsSource(to.to_string()));
    }
    if origin.role() == Role::Sink {
        return Err(ConnectionError::OriginIsSink(from.to_string()));
    }

    if workflow.has_connection(from, to) {
        return Err(ConnectionError::Duplicate {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    if workflow.rules().forbid_source_to_sink
        && origin.role() == Role::Source
        && target.role() == Role::Sink
    {
        return Err(ConnectionError::SourceToSink {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    Ok(())
}
