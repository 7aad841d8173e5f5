//! Definition validator: rejects state graphs whose externally-actionable
//! states are not wait-states.
//!
//! A task state that performs external work without suspending would bypass
//! the token store bookkeeping entirely -- its step would be invisible to the
//! correlation protocol and resumption would silently break. Validation is
//! fatal at construction time, before a definition can be deployed.
//!
//! Traversal covers exactly the states reachable from `start_at` (breadth
//! first over the transition graph), recursing into the branch sub-graphs of
//! `Parallel` states. Transition targets are checked for existence across
//! the whole graph.

use std::collections::HashMap;

use choreo_types::error::ValidationError;
use choreo_types::graph::{State, StateGraph};
use petgraph::graph::DiGraph;
use petgraph::visit::Bfs;

/// Validate a state-graph definition.
pub fn validate(graph: &StateGraph) -> Result<(), ValidationError> {
    if graph.states.is_empty() {
        return Err(ValidationError::EmptyGraph);
    }
    if !graph.states.contains_key(&graph.start_at) {
        return Err(ValidationError::MissingStart(graph.start_at.clone()));
    }

    let mut transitions = DiGraph::<&str, ()>::new();
    let indices: HashMap<&str, _> = graph
        .states
        .keys()
        .map(|name| (name.as_str(), transitions.add_node(name.as_str())))
        .collect();

    for (name, state) in &graph.states {
        for target in state.transition_targets() {
            let to = indices
                .get(target)
                .ok_or_else(|| ValidationError::UnknownTarget {
                    state: name.clone(),
                    target: target.to_string(),
                })?;
            transitions.add_edge(indices[name.as_str()], *to, ());
        }
    }

    let mut bfs = Bfs::new(&transitions, indices[graph.start_at.as_str()]);
    while let Some(node) = bfs.next(&transitions) {
        let name = transitions[node];
        match &graph.states[name] {
            State::Task { .. } => {
                return Err(ValidationError::NonWaitTask {
                    state: name.to_string(),
                });
            }
            State::Parallel { branches, .. } => {
                for branch in branches {
                    validate(branch)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
