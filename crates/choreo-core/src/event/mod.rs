//! In-process event delivery: broadcast bus and the routing layer that
//! dispatches matched events to the initiator and correlator.

pub mod bus;
pub mod router;
