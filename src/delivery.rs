// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Delivery Workflow
//!
//! Connect with retry, declare the topology, publish, release. The session is
//! closed, channel first, on every path that opened it, whatever the outcome
//! of the declaration and the publish.

use crate::{
    broker::AmqpConnector,
    connection::{connect, AmqpSession},
    errors::AmqpError,
    publisher::RabbitMQPublisher,
    report::Outcome,
    request::{DeliveryRequest, RawDeliveryParams},
    retry::DEFAULT_RETRY_DELAY,
    topology::declare_topology,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Sends messages through a broker connector.
pub struct MessageSender<C> {
    connector: C,
    retry_delay: Duration,
}

impl<C: AmqpConnector> MessageSender<C> {
    /// Creates a sender waiting one second between connection attempts.
    pub fn new(connector: C) -> MessageSender<C> {
        MessageSender {
            connector,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Overrides the wait between connection attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Runs one delivery for an already validated request.
    pub async fn deliver(&self, request: &DeliveryRequest) -> Result<(), AmqpError> {
        let mut session = connect(&self.connector, request, self.retry_delay).await?;

        let result = declare_and_publish(&mut session, request).await;

        if let Err(err) = session.close().await {
            warn!(error = err.to_string(), "failure to release the amqp session");
        }

        result
    }

    /// Validates `params` and, when they pass, runs the delivery.
    ///
    /// Invalid parameters never reach the connector.
    pub async fn send(&self, params: RawDeliveryParams) -> Outcome {
        match DeliveryRequest::try_from(params) {
            Ok(request) => Outcome::from(self.deliver(&request).await),
            Err(err) => {
                debug!(error = err.to_string(), "invalid delivery parameters");
                Outcome::from(err)
            }
        }
    }
}

async fn declare_and_publish(
    session: &mut AmqpSession,
    request: &DeliveryRequest,
) -> Result<(), AmqpError> {
    let channel = declare_topology(session, request).await?;
    RabbitMQPublisher::new(channel).publish(request).await
}
