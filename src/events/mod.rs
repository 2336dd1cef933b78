//! # Lifecycle Events
//!
//! Broadcast channel for observing flow and processor lifecycle transitions.
//! Event names live in [`crate::constants::events`]; contexts are loose JSON
//! payloads so subscribers stay decoupled from internal types.

pub mod publisher;

pub use publisher::{EventPublisher, PublishedEvent};
