// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Topology Management
//!
//! This module makes sure the destination of a delivery exists before the
//! message is published: the exchange, the queue and the binding between them.
//! Declarations are idempotent on the broker, so running the same delivery
//! twice declares nothing new the second time.
//!
//! The main components are:
//! - `ResolvedTopology`: the names derived from a request through the
//!   routing-key/queue-name fallback rules
//! - `AmqpTopology`: holds the exchange, queue and binding definitions and
//!   installs them on a channel
//! - `declare_topology`: the declaration step of the delivery workflow

use crate::{
    broker::AmqpChannel,
    connection::AmqpSession,
    errors::AmqpError,
    exchange::ExchangeDefinition,
    queue::{QueueBinding, QueueDefinition},
    request::DeliveryRequest,
};
use tracing::debug;

/// Names used to declare, bind and publish for one request.
///
/// A missing queue name falls back to the routing key for the declaration,
/// and a missing routing key falls back to the queue name for the binding.
/// The binding target and the publish key stay the raw values given by the
/// caller: with an empty queue name the binding names the empty queue, which
/// AMQP 0-9-1 brokers resolve to the queue just declared on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopology {
    /// The queue to declare.
    pub queue_name: String,
    /// The queue named in the binding, as given.
    pub binding_queue: String,
    /// The routing key of the binding.
    pub binding_key: String,
    /// The routing key used to publish, as given.
    pub publish_key: String,
}

impl ResolvedTopology {
    pub fn resolve(request: &DeliveryRequest) -> ResolvedTopology {
        let queue = request.queue_name();
        let key = request.routing_key();

        ResolvedTopology {
            queue_name: if queue.is_empty() { key } else { queue }.to_owned(),
            binding_queue: queue.to_owned(),
            binding_key: if key.is_empty() { queue } else { key }.to_owned(),
            publish_key: key.to_owned(),
        }
    }
}

/// The exchange, queue and binding of one delivery, installed on a channel.
///
/// Installation runs in a fixed order: the exchange, then the queue, then the
/// binding. Parts that were not set are skipped.
pub struct AmqpTopology<'tp> {
    channel: &'tp dyn AmqpChannel,
    pub(crate) exchange: Option<ExchangeDefinition>,
    pub(crate) queue: Option<QueueDefinition>,
    pub(crate) queue_binding: Option<QueueBinding>,
}

impl<'tp> AmqpTopology<'tp> {
    /// Creates an empty topology bound to `channel`.
    pub fn new(channel: &'tp dyn AmqpChannel) -> AmqpTopology<'tp> {
        AmqpTopology {
            channel,
            exchange: None,
            queue: None,
            queue_binding: None,
        }
    }

    /// Sets the exchange to declare.
    pub fn exchange(mut self, def: ExchangeDefinition) -> Self {
        self.exchange = Some(def);
        self
    }

    /// Sets the queue to declare.
    pub fn queue(mut self, def: QueueDefinition) -> Self {
        self.queue = Some(def);
        self
    }

    /// Sets the queue-to-exchange binding.
    pub fn queue_binding(mut self, binding: QueueBinding) -> Self {
        self.queue_binding = Some(binding);
        self
    }

    /// Installs the topology on the broker.
    ///
    /// The first failing declaration aborts the installation.
    pub async fn install(&self) -> Result<(), AmqpError> {
        self.install_exchange().await?;
        self.install_queue().await?;
        self.binding_queue().await
    }

    async fn install_exchange(&self) -> Result<(), AmqpError> {
        if let Some(exch) = &self.exchange {
            debug!("creating exchange: {} ({})", exch.name, exch.kind);
            self.channel.exchange_declare(exch).await?;
            debug!("exchange: {} was created", exch.name);
        }

        Ok(())
    }

    async fn install_queue(&self) -> Result<(), AmqpError> {
        if let Some(def) = &self.queue {
            debug!("creating queue: {}", def.name);
            self.channel.queue_declare(def).await?;
            debug!("queue: {} was created", def.name);
        }

        Ok(())
    }

    async fn binding_queue(&self) -> Result<(), AmqpError> {
        if let Some(binding) = &self.queue_binding {
            debug!(
                "binding queue: {} to the exchange: {} with the key: {}",
                binding.queue_name, binding.exchange_name, binding.routing_key
            );
            self.channel.queue_bind(binding).await?;
        }

        Ok(())
    }
}

/// Declares the destination of `request` on the session's channel and hands
/// the channel back for publishing.
///
/// The exchange is declared transient with the requested type, the queue
/// durable, non-exclusive and not auto-deleted.
pub async fn declare_topology<'s>(
    session: &'s mut AmqpSession,
    request: &DeliveryRequest,
) -> Result<&'s dyn AmqpChannel, AmqpError> {
    let resolved = ResolvedTopology::resolve(request);
    let channel = session.channel().await?;

    AmqpTopology::new(channel)
        .exchange(ExchangeDefinition::new(request.exchange_name()).kind(request.exchange_kind()))
        .queue(QueueDefinition::new(&resolved.queue_name).durable())
        .queue_binding(
            QueueBinding::new(&resolved.binding_queue)
                .exchange(request.exchange_name())
                .routing_key(&resolved.binding_key),
        )
        .install()
        .await?;

    Ok(channel)
}
