//! State-graph definition model.
//!
//! A choreography's workflow definition is a named-state graph in the style of
//! state-machine definition languages: one start state, each state being one
//! of a closed set of kinds. Only the `Wait` kind suspends for an external
//! signal and therefore participates in correlation; `Task` exists so that
//! definitions containing non-suspending external work can be expressed --
//! and rejected by the validator before deployment.
//!
//! Definitions round-trip through YAML and JSON:
//!
//! ```yaml
//! start_at: Wait For Cleaning
//! states:
//!   Wait For Cleaning:
//!     type: wait
//!     entity_id_path: "$.car.id"
//!     branch_key: Car Cleaned
//!     next: Done
//!   Done:
//!     type: succeed
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete state-graph definition: a start state and a named state map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateGraph {
    /// Name of the state execution begins in.
    pub start_at: String,
    /// All states, keyed by name.
    pub states: HashMap<String, State>,
}

impl StateGraph {
    /// Parse a definition from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(text)
    }

    /// Parse a definition from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// One state in the graph.
///
/// A closed sum over state kinds: only `Wait` carries correlation fields,
/// and only `Task` represents external work that does not suspend. The
/// remaining kinds are pure control states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum State {
    /// Suspend until an external signal arrives for this branch.
    Wait {
        /// Dotted path into the state input resolving to the entity id.
        entity_id_path: String,
        /// Event discriminator; `None` means the reserved Default key
        /// (the state is the sole pending wait).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// Non-suspending external work. Rejected by the definition validator:
    /// such a step would bypass correlation bookkeeping entirely.
    Task {
        /// Opaque identifier of the invoked resource.
        resource: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// Data-driven branching.
    Choice {
        choices: Vec<ChoiceRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Concurrent branches, each its own sub-graph.
    Parallel {
        branches: Vec<StateGraph>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// Terminal success.
    Succeed {},
    /// Terminal failure.
    Fail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },
    /// No-op pass-through.
    Pass {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
}

impl State {
    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            State::Wait { .. } => "wait",
            State::Task { .. } => "task",
            State::Choice { .. } => "choice",
            State::Parallel { .. } => "parallel",
            State::Succeed {} => "succeed",
            State::Fail { .. } => "fail",
            State::Pass { .. } => "pass",
        }
    }

    /// Names of states this state can transition to within the same graph.
    ///
    /// Parallel branch sub-graphs are not included; callers recurse into
    /// `branches` themselves.
    pub fn transition_targets(&self) -> Vec<&str> {
        match self {
            State::Wait { next, .. }
            | State::Task { next, .. }
            | State::Pass { next }
            | State::Parallel { next, .. } => next.as_deref().into_iter().collect(),
            State::Choice { choices, default } => choices
                .iter()
                .map(|rule| rule.next.as_str())
                .chain(default.as_deref())
                .collect(),
            State::Succeed {} | State::Fail { .. } => Vec::new(),
        }
    }
}

/// A single branch rule of a `Choice` state: equality comparison between a
/// path into the state input and a literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRule {
    /// Dotted path into the state input.
    pub variable: String,
    /// Literal the resolved value is compared against.
    pub equals: Value,
    /// Target state when the comparison holds.
    pub next: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_graph() -> StateGraph {
        let mut states = HashMap::new();
        states.insert(
            "Wait For Confirmation".to_string(),
            State::Wait {
                entity_id_path: "$.order.id".to_string(),
                branch_key: None,
                next: Some("Check Outcome".to_string()),
            },
        );
        states.insert(
            "Check Outcome".to_string(),
            State::Choice {
                choices: vec![ChoiceRule {
                    variable: "$.outcome".to_string(),
                    equals: json!("confirmed"),
                    next: "Done".to_string(),
                }],
                default: Some("Rejected".to_string()),
            },
        );
        states.insert("Done".to_string(), State::Succeed {});
        states.insert(
            "Rejected".to_string(),
            State::Fail {
                error: Some("OrderRejected".to_string()),
                cause: None,
            },
        );
        StateGraph {
            start_at: "Wait For Confirmation".to_string(),
            states,
        }
    }

    #[test]
    fn yaml_roundtrip() {
        let graph = sample_graph();
        let yaml = serde_yaml_ng::to_string(&graph).unwrap();
        assert!(yaml.contains("type: wait"));
        assert!(yaml.contains("type: choice"));
        let parsed = StateGraph::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, graph);
    }

    #[test]
    fn json_roundtrip() {
        let graph = sample_graph();
        let json_str = serde_json::to_string(&graph).unwrap();
        let parsed = StateGraph::from_json(&json_str).unwrap();
        assert_eq!(parsed, graph);
    }

    #[test]
    fn parse_realistic_yaml_definition() {
        let yaml = r#"
start_at: Fan Out
states:
  Fan Out:
    type: parallel
    next: Done
    branches:
      - start_at: Wait For Cleaning
        states:
          Wait For Cleaning:
            type: wait
            entity_id_path: "$.car.id"
            branch_key: Car Cleaned
      - start_at: Wait For Repair
        states:
          Wait For Repair:
            type: wait
            entity_id_path: "$.car.id"
            branch_key: Car Repaired
  Done:
    type: succeed
"#;
        let graph = StateGraph::from_yaml(yaml).unwrap();
        assert_eq!(graph.start_at, "Fan Out");
        let State::Parallel { branches, next } = &graph.states["Fan Out"] else {
            panic!("expected parallel state");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(next.as_deref(), Some("Done"));
        let State::Wait { branch_key, .. } =
            &branches[0].states["Wait For Cleaning"]
        else {
            panic!("expected wait state");
        };
        assert_eq!(branch_key.as_deref(), Some("Car Cleaned"));
    }

    #[test]
    fn transition_targets_cover_all_kinds() {
        let graph = sample_graph();
        assert_eq!(
            graph.states["Wait For Confirmation"].transition_targets(),
            vec!["Check Outcome"]
        );
        let mut choice_targets = graph.states["Check Outcome"].transition_targets();
        choice_targets.sort();
        assert_eq!(choice_targets, vec!["Done", "Rejected"]);
        assert!(graph.states["Done"].transition_targets().is_empty());
        assert!(graph.states["Rejected"].transition_targets().is_empty());
    }

    #[test]
    fn kind_names() {
        assert_eq!(State::Succeed {}.kind(), "succeed");
        assert_eq!(
            State::Task {
                resource: "arn:some:resource".to_string(),
                next: None
            }
            .kind(),
            "task"
        );
    }

    #[test]
    fn wait_without_branch_key_deserializes_to_none() {
        let yaml = r#"
type: wait
entity_id_path: "$.id"
"#;
        let state: State = serde_yaml_ng::from_str(yaml).unwrap();
        let State::Wait { branch_key, next, .. } = state else {
            panic!("expected wait");
        };
        assert_eq!(branch_key, None);
        assert_eq!(next, None);
    }
}
