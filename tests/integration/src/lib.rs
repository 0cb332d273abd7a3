//! Integration test utilities for the room relay
//!
//! This crate provides helpers for running end-to-end tests against the
//! WebSocket gateway and its operational endpoints.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
