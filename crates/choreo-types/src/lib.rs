//! Shared domain types for Choreo.
//!
//! This crate contains the core domain types used across the Choreo platform:
//! correlation records, domain events, the state-graph definition model, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod correlation;
pub mod error;
pub mod event;
pub mod graph;
pub mod path;
