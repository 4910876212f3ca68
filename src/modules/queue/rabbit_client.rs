//! RabbitMQ publisher for file notifications
//!
//! A single fanout exchange carries one message per file row. Every user
//! gets a durable queue named `{prefix}:{user_id}` bound to that exchange,
//! so each consumer sees the full notification stream.

use lapin::options::{
    BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::RabbitConfig;
use crate::core::error::AppError;

/// Payload published for each file row, encoded as a msgpack map
#[derive(Debug, Serialize, Deserialize)]
pub struct FileNotification {
    pub file_id: i32,
}

/// RabbitMQ client owning one connection and one publish channel
pub struct RabbitClient {
    // The channel is only valid while its connection lives
    _connection: Connection,
    channel: Channel,
    config: RabbitConfig,
}

impl RabbitClient {
    /// Connect to the broker and declare the fanout exchange
    pub async fn connect(config: RabbitConfig) -> Result<Self, AppError> {
        let connection = Connection::connect(&config.url, ConnectionProperties::default())
            .await
            .map_err(|e| AppError::Queue(format!("Failed to connect to RabbitMQ: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| AppError::Queue(format!("Failed to open RabbitMQ channel: {}", e)))?;

        channel
            .exchange_declare(
                &config.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::Queue(format!(
                    "Failed to declare exchange '{}': {}",
                    config.exchange, e
                ))
            })?;

        info!("RabbitMQ connected, fanout exchange '{}' declared", config.exchange);

        Ok(Self {
            _connection: connection,
            channel,
            config,
        })
    }

    /// Declare the user's durable queue and bind it to the fanout exchange
    ///
    /// Declaring an existing queue with the same arguments is a no-op on
    /// the broker.
    pub async fn declare_user_queue(&self, user_id: i32) -> Result<(), AppError> {
        let queue_name = self.config.user_queue_name(user_id);

        self.channel
            .queue_declare(
                &queue_name,
                QueueDeclareOptions {
                    durable: true,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::Queue(format!("Failed to declare queue '{}': {}", queue_name, e))
            })?;

        self.channel
            .queue_bind(
                &queue_name,
                &self.config.exchange,
                &queue_name,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::Queue(format!(
                    "Failed to bind queue '{}' to exchange '{}': {}",
                    queue_name, self.config.exchange, e
                ))
            })?;

        debug!(
            "Queue '{}' bound to exchange '{}'",
            queue_name, self.config.exchange
        );
        Ok(())
    }

    /// Publish one file notification to the fanout exchange
    ///
    /// Delivery is fire-and-forget: the broker ack is not awaited and
    /// consumers are never tracked here.
    pub async fn publish_file_notification(&self, file_id: i32) -> Result<(), AppError> {
        let payload = rmp_serde::to_vec_named(&FileNotification { file_id })
            .map_err(|e| AppError::Queue(format!("Failed to encode notification: {}", e)))?;

        // The returned confirm is dropped without being awaited
        let _confirm = self
            .channel
            .basic_publish(
                &self.config.exchange,
                "",
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_content_type("text/plain".into()),
            )
            .await
            .map_err(|e| {
                AppError::Queue(format!(
                    "Failed to publish notification for file {}: {}",
                    file_id, e
                ))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_encodes_as_string_keyed_map() {
        let payload = rmp_serde::to_vec_named(&FileNotification { file_id: 7 })
            .expect("encoding should succeed");

        // Consumers decode a map, not a positional tuple
        let value: serde_json::Value =
            rmp_serde::from_slice(&payload).expect("decoding should succeed");
        assert_eq!(value["file_id"], 7);
    }

    #[test]
    fn notification_round_trips() {
        let payload = rmp_serde::to_vec_named(&FileNotification { file_id: 123 })
            .expect("encoding should succeed");

        let decoded: FileNotification =
            rmp_serde::from_slice(&payload).expect("decoding should succeed");
        assert_eq!(decoded.file_id, 123);
    }
}
