// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Message Publisher
//!
//! This module publishes the message of a [`DeliveryRequest`] to its exchange.
//! Messages are sent as-is, without any properties: no persistence flag, no
//! content type and no headers.

use crate::{broker::AmqpChannel, errors::AmqpError, request::DeliveryRequest};
use tracing::debug;

/// Publishes messages on an already open channel.
pub struct RabbitMQPublisher<'p> {
    channel: &'p dyn AmqpChannel,
}

impl<'p> RabbitMQPublisher<'p> {
    /// Creates a new publisher over `channel`.
    pub fn new(channel: &'p dyn AmqpChannel) -> RabbitMQPublisher<'p> {
        RabbitMQPublisher { channel }
    }

    /// Publishes the request's message to its exchange.
    ///
    /// The routing key is the one given by the caller, even when it is empty
    /// and the binding fell back to the queue name.
    ///
    /// # Returns
    /// Ok(()) on success or `AmqpError::PublishingError` on failure
    pub async fn publish(&self, request: &DeliveryRequest) -> Result<(), AmqpError> {
        debug!(
            exchange = request.exchange_name(),
            routing_key = request.routing_key(),
            bytes = request.message().len(),
            "publishing message"
        );

        self.channel
            .basic_publish(
                request.exchange_name(),
                request.routing_key(),
                request.message(),
            )
            .await?;

        debug!("message published");
        Ok(())
    }
}
