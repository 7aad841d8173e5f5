//! Routing layer: subscribes to the event bus and dispatches matched events
//! to the initiator and correlator.
//!
//! Start-matcher hits create a new workflow instance; transition-matcher
//! hits are extracted to `DomainEvent`s and correlated. Events matching
//! neither are dropped. Dispatch errors are logged and the loop continues --
//! retry policy belongs to the delivery substrate, not this in-process
//! harness router.

use std::sync::Arc;

use choreo_types::event::BusEvent;
use choreo_types::path;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::choreography::Choreography;
use crate::correlator::EventCorrelator;
use crate::engine::WorkflowEngine;
use crate::event::bus::EventBus;
use crate::initiator::WorkflowInitiator;
use crate::repository::token::TokenStore;

/// Dispatches bus events for one choreography.
pub struct EventRouter<S: TokenStore, E: WorkflowEngine> {
    choreography: Arc<Choreography>,
    initiator: Arc<WorkflowInitiator<S, E>>,
    correlator: Arc<EventCorrelator<S, E>>,
}

impl<S, E> EventRouter<S, E>
where
    S: TokenStore + 'static,
    E: WorkflowEngine + 'static,
{
    pub fn new(
        choreography: Arc<Choreography>,
        initiator: Arc<WorkflowInitiator<S, E>>,
        correlator: Arc<EventCorrelator<S, E>>,
    ) -> Self {
        Self {
            choreography,
            initiator,
            correlator,
        }
    }

    /// Subscribe to the bus and dispatch until cancelled or the bus closes.
    pub fn spawn(self, bus: &EventBus, cancel: CancellationToken) -> JoinHandle<()> {
        let mut receiver = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = receiver.recv() => match received {
                        Ok(event) => self.dispatch(&event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event bus receiver lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    async fn dispatch(&self, event: &BusEvent) {
        if self.choreography.start_matcher().matches(event) {
            self.dispatch_start(event).await;
        } else if let Some(matcher) = self.choreography.matching_transition(event) {
            match matcher.extract(event) {
                Some(domain_event) => match self.correlator.handle_event(&domain_event).await {
                    Ok(outcome) => {
                        tracing::debug!(
                            entity_id = domain_event.entity_id.as_str(),
                            branch_key = domain_event.branch_key.as_str(),
                            ?outcome,
                            "correlated event"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            entity_id = domain_event.entity_id.as_str(),
                            branch_key = domain_event.branch_key.as_str(),
                            error = %err,
                            "failed to correlate event"
                        );
                    }
                },
                None => {
                    tracing::warn!(
                        detail_type = event.detail_type.as_str(),
                        entity_id_path = matcher.entity_id_path.as_str(),
                        "transition event carried no entity id at the configured path"
                    );
                }
            }
        } else {
            tracing::trace!(
                source = event.source.as_str(),
                detail_type = event.detail_type.as_str(),
                "dropping unmatched event"
            );
        }
    }

    async fn dispatch_start(&self, event: &BusEvent) {
        let matcher = self.choreography.start_matcher();
        let Some(entity_id) = path::resolve_string(&event.detail, &matcher.entity_id_path)
        else {
            tracing::warn!(
                detail_type = event.detail_type.as_str(),
                entity_id_path = matcher.entity_id_path.as_str(),
                "start event carried no entity id at the configured path"
            );
            return;
        };

        match self
            .initiator
            .start(&entity_id, self.choreography.definition_id(), &event.detail)
            .await
        {
            Ok(execution_id) => {
                tracing::debug!(
                    entity_id = entity_id.as_str(),
                    execution_id = execution_id.as_str(),
                    "started instance from event"
                );
            }
            Err(err) => {
                tracing::warn!(
                    entity_id = entity_id.as_str(),
                    error = %err,
                    "failed to start instance from event"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
