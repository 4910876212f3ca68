//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external services like storage, messaging, etc.

pub mod queue;
pub mod storage;
