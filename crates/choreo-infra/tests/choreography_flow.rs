//! End-to-end choreography flows against the in-memory store and engine:
//! simulation script -> event bus -> router -> initiator/correlator.
//!
//! The engine here is the map-backed fake; wait-state entries are driven by
//! hand (issue a token, call `on_entry`) exactly where a real engine would
//! suspend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use choreo_core::choreography::Choreography;
use choreo_core::correlator::EventCorrelator;
use choreo_core::event::bus::EventBus;
use choreo_core::event::router::EventRouter;
use choreo_core::initiator::WorkflowInitiator;
use choreo_core::repository::token::TokenStore;
use choreo_core::simulation::{SimulationDriver, SimulationScript};
use choreo_core::wait::WaitStateBuilder;
use choreo_infra::engine::memory::{ExecutionStatus, InMemoryEngine};
use choreo_infra::memory::InMemoryTokenStore;
use choreo_types::correlation::CorrelationRecord;
use choreo_types::event::EventMatcher;
use choreo_types::graph::{State, StateGraph};
use serde_json::json;
use tokio_util::sync::CancellationToken;

struct Harness {
    bus: EventBus,
    store: Arc<InMemoryTokenStore>,
    engine: Arc<InMemoryEngine>,
    cancel: CancellationToken,
}

impl Harness {
    fn start(choreography: Choreography) -> Self {
        let bus = EventBus::new(64);
        let store = Arc::new(InMemoryTokenStore::new());
        let engine = Arc::new(InMemoryEngine::new());
        let router = EventRouter::new(
            Arc::new(choreography),
            Arc::new(WorkflowInitiator::new(store.clone(), engine.clone())),
            Arc::new(EventCorrelator::new(store.clone(), engine.clone())),
        );
        let cancel = CancellationToken::new();
        router.spawn(&bus, cancel.clone());
        Self {
            bus,
            store,
            engine,
            cancel,
        }
    }

    async fn publish_script(&self, script: SimulationScript) {
        SimulationDriver::new(self.bus.clone())
            .run(&script, &CancellationToken::new())
            .await;
        // Let the router drain the bus.
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    async fn default_record(&self, entity_id: &str) -> Option<CorrelationRecord> {
        self.store
            .get(entity_id)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.is_default())
    }
}

fn entry(source: &str, branch_key: &str, detail: serde_json::Value) -> SimulationScript {
    SimulationScript {
        entries: vec![choreo_core::simulation::SimulationEntry {
            source: source.to_string(),
            branch_key: branch_key.to_string(),
            detail,
            wait_seconds: 0,
        }],
    }
}

/// Car preparation: registration fans out into three parallel waits.
fn car_prep_choreography() -> Choreography {
    let cleaning = branch_graph("Wait For Cleaning", "Car Cleaned");
    let repair = branch_graph("Wait For Repair", "Car Repaired");
    let pricing = branch_graph("Wait For Pricing", "Car Priced");

    let mut states = HashMap::new();
    states.insert(
        "Prepare Car".to_string(),
        State::Parallel {
            branches: vec![cleaning, repair, pricing],
            next: Some("Ready For Sale".to_string()),
        },
    );
    states.insert("Ready For Sale".to_string(), State::Succeed {});

    Choreography::new(
        "car-prep",
        StateGraph {
            start_at: "Prepare Car".to_string(),
            states,
        },
        EventMatcher::new("dealer-intake", "Car Registered", "$.car.id"),
        vec![
            EventMatcher::new("cleaning-service", "Car Cleaned", "$.car.id"),
            EventMatcher::new("repair-service", "Car Repaired", "$.car.id"),
            EventMatcher::new("pricing-service", "Car Priced", "$.car.id"),
            EventMatcher::new("damage-inspection", "Car Scratched", "$.car.id"),
        ],
    )
    .unwrap()
}

fn branch_graph(state_name: &str, branch_key: &str) -> StateGraph {
    let mut states = HashMap::new();
    states.insert(
        state_name.to_string(),
        State::Wait {
            entity_id_path: "$.car.id".to_string(),
            branch_key: Some(branch_key.to_string()),
            next: None,
        },
    );
    StateGraph {
        start_at: state_name.to_string(),
        states,
    }
}

#[tokio::test]
async fn parallel_choreography_resumes_matched_branch_and_aborts_on_unexpected() {
    let harness = Harness::start(car_prep_choreography());
    let car = json!({"car": {"id": "car-7", "model": "wagon"}});

    // Registration starts the instance and writes the Default record.
    harness
        .publish_script(entry("dealer-intake", "Car Registered", car.clone()))
        .await;

    let default = harness.default_record("car-7").await.expect("Default record");
    let execution_id = default.execution_id.clone().expect("execution id");
    assert_eq!(
        harness.engine.execution(&execution_id).unwrap().status,
        ExecutionStatus::Running
    );

    // The engine enters the three parallel wait-states; each entry persists
    // a branch record keyed by its discriminator.
    let builder =
        WaitStateBuilder::new(harness.store.clone()).with_default_entity_id_path("$.car.id");
    let mut tokens = HashMap::new();
    for (state_name, branch_key) in [
        ("Wait For Cleaning", "Car Cleaned"),
        ("Wait For Repair", "Car Repaired"),
        ("Wait For Pricing", "Car Priced"),
    ] {
        let wait = builder
            .state(state_name)
            .event_name(branch_key)
            .build()
            .unwrap();
        let token = harness.engine.issue_token();
        wait.on_entry(&token, &car).await.unwrap();
        tokens.insert(branch_key, token);
    }
    assert_eq!(harness.store.len(), 4);

    // A matching event resumes exactly its branch and removes its record.
    harness
        .publish_script(entry("repair-service", "Car Repaired", car.clone()))
        .await;
    assert!(harness.engine.is_consumed(&tokens["Car Repaired"]));
    assert!(!harness.engine.is_consumed(&tokens["Car Cleaned"]));
    assert_eq!(harness.store.len(), 3);

    // An event matching no pending branch aborts the whole instance; the
    // remaining records are left untouched.
    harness
        .publish_script(entry("damage-inspection", "Car Scratched", car.clone()))
        .await;
    let status = harness.engine.execution(&execution_id).unwrap().status;
    let ExecutionStatus::Aborted { cause } = status else {
        panic!("expected aborted execution, got {status:?}");
    };
    assert!(cause.contains("Car Scratched"));
    assert!(cause.contains("car-7"));
    assert_eq!(harness.store.len(), 3);

    harness.cancel.cancel();
}

/// Order fulfilment: a single sequential wait, discrimination delegated to a
/// downstream choice state.
fn order_choreography() -> Choreography {
    let mut states = HashMap::new();
    states.insert(
        "Wait For Outcome".to_string(),
        State::Wait {
            entity_id_path: "$.order.id".to_string(),
            branch_key: None,
            next: Some("Route Outcome".to_string()),
        },
    );
    states.insert(
        "Route Outcome".to_string(),
        State::Choice {
            choices: vec![choreo_types::graph::ChoiceRule {
                variable: "$.outcome".to_string(),
                equals: json!("confirmed"),
                next: "Done".to_string(),
            }],
            default: Some("Cancelled".to_string()),
        },
    );
    states.insert("Done".to_string(), State::Succeed {});
    states.insert(
        "Cancelled".to_string(),
        State::Fail {
            error: Some("OrderCancelled".to_string()),
            cause: None,
        },
    );

    Choreography::new(
        "order-fulfilment",
        StateGraph {
            start_at: "Wait For Outcome".to_string(),
            states,
        },
        EventMatcher::new("shop", "Order Placed", "$.order.id"),
        vec![
            EventMatcher::new("shop", "Order Confirmed", "$.order.id"),
            EventMatcher::new("shop", "Order Cancelled", "$.order.id"),
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn sequential_choreography_resumes_any_event_and_keeps_the_record() {
    let harness = Harness::start(order_choreography());
    let order = json!({"order": {"id": "order-42"}});

    harness
        .publish_script(entry("shop", "Order Placed", order.clone()))
        .await;
    assert!(harness.default_record("order-42").await.is_some());

    // The engine enters the sole wait-state: no discriminator, so the entry
    // upserts the token onto the Default key instead of adding a record.
    let wait = WaitStateBuilder::new(harness.store.clone())
        .state("Wait For Outcome")
        .entity_id("$.order.id")
        .build()
        .unwrap();
    let token = harness.engine.issue_token();
    wait.on_entry(&token, &order).await.unwrap();
    assert_eq!(harness.store.len(), 1);

    // Single-wait mode resumes on any branch key; the record is retained.
    harness
        .publish_script(entry("shop", "Order Cancelled", order.clone()))
        .await;
    assert!(harness.engine.is_consumed(&token));
    assert_eq!(
        harness.engine.delivered_payload(&token).unwrap()["order"]["id"],
        "order-42"
    );
    assert_eq!(harness.store.len(), 1);

    // A duplicate delivery re-reads the retained record; the engine rejects
    // the second signal on the terminal token and nothing else changes.
    harness
        .publish_script(entry("shop", "Order Confirmed", order.clone()))
        .await;
    assert_eq!(harness.store.len(), 1);

    harness.cancel.cancel();
}
