// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the RabbitMQ Sender
//!
//! This module provides the error types for a single delivery. `ValidationError`
//! covers malformed input detected before any network activity, while `AmqpError`
//! covers every broker-side failure: connection exhaustion, channel creation,
//! topology declaration, publishing and resource release.

use thiserror::Error;

/// Represents errors that can occur while talking to the RabbitMQ broker.
///
/// Every variant that originates from the broker carries the reason text
/// reported by the client library, so it can be surfaced to the operator as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmqpError {
    /// Every connection attempt failed; carries the reason of the last one
    #[error("failure to connect to `{host}:{port}` after {attempts} attempts: {reason}")]
    ConnectionError {
        host: String,
        port: u16,
        attempts: u32,
        reason: String,
    },

    /// A single connection attempt failed
    #[error("failure to open connection: {0}")]
    ConnectAttemptError(String),

    /// Error creating a channel from an established connection
    #[error("failure to create a channel: {0}")]
    ChannelError(String),

    /// Error declaring an exchange with the given name
    #[error("failure to declare exchange `{name}`: {reason}")]
    DeclareExchangeError { name: String, reason: String },

    /// Error declaring a queue with the given name
    #[error("failure to declare queue `{name}`: {reason}")]
    DeclareQueueError { name: String, reason: String },

    /// Error binding a queue to an exchange
    #[error("failure to bind queue `{queue}` to exchange `{exchange}`: {reason}")]
    BindingExchangeToQueueError {
        exchange: String,
        queue: String,
        reason: String,
    },

    /// Error publishing a message
    #[error("failure to publish: {0}")]
    PublishingError(String),

    /// Error closing a channel or a connection
    #[error("failure to close: {0}")]
    CloseError(String),
}

impl AmqpError {
    /// Returns the reason text reported by the broker or the client library.
    pub fn reason(&self) -> &str {
        match self {
            AmqpError::ConnectionError { reason, .. }
            | AmqpError::DeclareExchangeError { reason, .. }
            | AmqpError::DeclareQueueError { reason, .. }
            | AmqpError::BindingExchangeToQueueError { reason, .. } => reason,
            AmqpError::ConnectAttemptError(reason)
            | AmqpError::ChannelError(reason)
            | AmqpError::PublishingError(reason)
            | AmqpError::CloseError(reason) => reason,
        }
    }
}

/// Represents a rejected set of delivery parameters.
///
/// Validation happens before any broker I/O and is never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory parameter was absent or blank
    #[error("missing mandatory parameter `{0}`")]
    MissingField(&'static str),

    /// The exchange type is not one of direct, fanout or topic
    #[error("unsupported exchange type `{0}`, expected direct, fanout or topic")]
    InvalidExchangeType(String),

    /// Neither a routing key nor a queue name was given
    #[error("a routing key or a queue name must be given")]
    MissingRoutingKeyAndQueue,

    /// Attempts outside of 1..=30, or not a number
    #[error("attempts must be an integer between 1 and 30, got `{0}`")]
    AttemptsOutOfRange(i64),

    /// Port not above 1024, beyond 65535, or not a number
    #[error("port must be an integer greater than 1024, got `{0}`")]
    PortOutOfRange(i64),

    /// The command line could not be parsed, e.g. an unknown flag
    #[error("{0}")]
    InvalidArgument(String),
}
