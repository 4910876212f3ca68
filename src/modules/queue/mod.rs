//! Queue module for file notifications
//!
//! Provides a RabbitMQ publisher that fans file notifications out to
//! per-user queues.

mod rabbit_client;

pub use rabbit_client::{FileNotification, RabbitClient};
