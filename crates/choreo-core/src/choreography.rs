//! Choreography binding: a validated state-graph definition plus the event
//! matchers that drive it.
//!
//! The binding is immutable after construction. The routing layer consumes
//! it to decide which bus events start a new instance (`start_matcher`) and
//! which resume pending branches (`transition_matchers`).

use choreo_types::error::ValidationError;
use choreo_types::event::{BusEvent, EventMatcher};
use choreo_types::graph::StateGraph;

use crate::validator;

/// A workflow definition bound to its triggering events.
#[derive(Debug)]
pub struct Choreography {
    definition_id: String,
    definition: StateGraph,
    start_matcher: EventMatcher,
    transition_matchers: Vec<EventMatcher>,
}

impl Choreography {
    /// Bind a definition to its event matchers.
    ///
    /// The definition is validated here; an invalid graph (any reachable
    /// non-wait task state, dangling transition, missing start) fails the
    /// whole construction before it can be deployed.
    pub fn new(
        definition_id: impl Into<String>,
        definition: StateGraph,
        start_matcher: EventMatcher,
        transition_matchers: Vec<EventMatcher>,
    ) -> Result<Self, ValidationError> {
        validator::validate(&definition)?;
        Ok(Self {
            definition_id: definition_id.into(),
            definition,
            start_matcher,
            transition_matchers,
        })
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn definition(&self) -> &StateGraph {
        &self.definition
    }

    pub fn start_matcher(&self) -> &EventMatcher {
        &self.start_matcher
    }

    pub fn transition_matchers(&self) -> &[EventMatcher] {
        &self.transition_matchers
    }

    /// The transition matcher selecting the given bus event, if any.
    pub fn matching_transition(&self, event: &BusEvent) -> Option<&EventMatcher> {
        self.transition_matchers
            .iter()
            .find(|matcher| matcher.matches(event))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
