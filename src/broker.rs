// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Broker Capabilities
//!
//! The sender never speaks the AMQP wire protocol itself. It consumes the
//! broker through three traits: a connector that opens connections, a
//! connection that hands out channels, and a channel that declares topology
//! and publishes. The production implementation lives in [`crate::channel`]
//! and is backed by `lapin`.

use crate::{
    errors::AmqpError,
    exchange::ExchangeDefinition,
    queue::{QueueBinding, QueueDefinition},
};
use async_trait::async_trait;
use std::fmt;

#[cfg(test)]
use mockall::automock;

/// Everything needed to open one broker connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub vhost: String,
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("vhost", &self.vhost)
            .finish()
    }
}

/// Opens connections to a broker.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AmqpConnector: Send + Sync {
    /// Performs one connection attempt: TCP, handshake and authentication.
    ///
    /// Failures are reported as [`AmqpError::ConnectAttemptError`].
    async fn connect(&self, params: &ConnectionParams)
        -> Result<Box<dyn AmqpConnection>, AmqpError>;
}

/// An open broker connection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AmqpConnection: Send + Sync {
    /// Opens a new channel multiplexed over this connection.
    async fn create_channel(&self) -> Result<Box<dyn AmqpChannel>, AmqpError>;

    /// Closes the connection gracefully.
    async fn close(&self) -> Result<(), AmqpError>;
}

/// A channel, the vehicle for every declare and publish operation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AmqpChannel: Send + Sync {
    /// Declares an exchange. Re-declaring with identical attributes is a no-op
    /// on the broker; a type mismatch is reported as an error.
    async fn exchange_declare(&self, def: &ExchangeDefinition) -> Result<(), AmqpError>;

    /// Declares a queue without extra arguments.
    async fn queue_declare(&self, def: &QueueDefinition) -> Result<(), AmqpError>;

    /// Binds a queue to an exchange.
    async fn queue_bind(&self, binding: &QueueBinding) -> Result<(), AmqpError>;

    /// Publishes `body` without any message properties.
    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), AmqpError>;

    /// Closes the channel gracefully.
    async fn close(&self) -> Result<(), AmqpError>;
}
