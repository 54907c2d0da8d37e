use crate::error::CompileError;
use crate::workflow::Workflow;
use ahash::AHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Finished,
}

/// Orders the workflow's nodes so every producer precedes its consumers.
///
/// Depth-first from every node in insertion order, visiting predecessors in
/// connection creation order and emitting in post-order. Isolated nodes are
/// included. The traversal uses an explicit stack, so graph depth is not
/// bounded by the call stack.
pub fn topological_order(workflow: &Workflow) -> Result<Vec<String>, CompileError> {
    let nodes = workflow.nodes();
    let index: AHashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id(), i))
        .collect();

    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for connection in workflow.connections() {
        // Dangling endpoints are reported by the integrity check, not here.
        if let (Some(&from), Some(&to)) = (
            index.get(connection.from.as_str()),
            index.get(connection.to.as_str()),
        ) {
            predecessors[to].push(from);
        }
    }

    let mut state = vec![VisitState::Unvisited; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    // (node, next predecessor to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..nodes.len() {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        state[root] = VisitState::InProgress;
        stack.push((root, 0));

        while let Some((node, cursor)) = stack.last_mut() {
            let node = *node;
            if let Some(&pred) = predecessors[node].get(*cursor) {
                *cursor += 1;
                match state[pred] {
                    VisitState::Unvisited => {
                        state[pred] = VisitState::InProgress;
                        stack.push((pred, 0));
                    }
                    VisitState::InProgress => {
                        return Err(cycle_error(workflow, &stack, pred));
                    }
                    VisitState::Finished => {}
                }
            } else {
                stack.pop();
                state[node] = VisitState::Finished;
                order.push(nodes[node].id().to_string());
            }
        }
    }

    Ok(order)
}

/// Builds the error for a back edge out of `entry`. The in-progress stack from
/// `entry` upward walks predecessors, so it is reversed to report the cycle in
/// edge direction: `entry -> ... -> entry`.
fn cycle_error(workflow: &Workflow, stack: &[(usize, usize)], entry: usize) -> CompileError {
    let nodes = workflow.nodes();
    let start = stack.iter().position(|(n, _)| *n == entry).unwrap_or(0);
    let cycle: Vec<String> = std::iter::once(entry)
        .chain(stack[start..].iter().rev().map(|(n, _)| *n))
        .map(|n| nodes[n].id().to_string())
        .collect();
    CompileError::CycleDetected {
        node_id: nodes[entry].id().to_string(),
        cycle,
    }
}
