// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Terminal outcome of one delivery and the status line printed for it.

use crate::errors::{AmqpError, ValidationError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was handed to the broker.
    Published,

    /// Every connection attempt failed.
    ConnectExhausted {
        host: String,
        port: u16,
        attempts: u32,
        reason: String,
    },

    /// A declaration or the publish itself was rejected.
    PublishFailed { reason: String },

    /// The parameters were rejected before any connection attempt.
    Invalid(ValidationError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Published)
    }

    /// 0 on success, 1 when the broker side failed, 2 for invalid input.
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Published => 0,
            Outcome::ConnectExhausted { .. } | Outcome::PublishFailed { .. } => 1,
            Outcome::Invalid(_) => 2,
        }
    }
}

impl From<Result<(), AmqpError>> for Outcome {
    fn from(result: Result<(), AmqpError>) -> Self {
        match result {
            Ok(()) => Outcome::Published,
            Err(AmqpError::ConnectionError {
                host,
                port,
                attempts,
                reason,
            }) => Outcome::ConnectExhausted {
                host,
                port,
                attempts,
                reason,
            },
            Err(err) => Outcome::PublishFailed {
                reason: err.to_string(),
            },
        }
    }
}

impl From<ValidationError> for Outcome {
    fn from(err: ValidationError) -> Self {
        Outcome::Invalid(err)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Published => write!(f, "Message successfully published."),
            Outcome::ConnectExhausted {
                host,
                port,
                attempts,
                reason,
            } => write!(
                f,
                "Could not connect to RabbitMQ in {host}:{port} after {attempts} attempts: {reason}"
            ),
            Outcome::PublishFailed { reason } => {
                write!(f, "The message could not be published: {reason}.")
            }
            Outcome::Invalid(err) => write!(f, "Invalid parameters: {err}"),
        }
    }
}
