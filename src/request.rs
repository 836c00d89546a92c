// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Delivery Request and Validation
//!
//! A [`DeliveryRequest`] can only be obtained by validating a
//! [`RawDeliveryParams`], so every request that reaches the broker layer is
//! complete and legal. Validation performs no I/O.

use crate::{broker::ConnectionParams, errors::ValidationError, exchange::ExchangeKind};
use std::fmt;

pub const DEFAULT_PORT: u16 = 5672;
pub const DEFAULT_VHOST: &str = "/";
pub const DEFAULT_ATTEMPTS: u32 = 5;
pub const MIN_ATTEMPTS: i64 = 1;
pub const MAX_ATTEMPTS: i64 = 30;
/// Ports up to and including this one are rejected.
pub const LOWEST_REJECTED_PORT: i64 = 1024;

/// Stands in for a number that could not be parsed.
const INVALID_NUMBER: i64 = -1;

/// Delivery parameters as received, before any check.
///
/// Numbers are kept as text so that a non-numeric value surfaces as a
/// validation error instead of a parse failure.
#[derive(Clone, PartialEq, Eq)]
pub struct RawDeliveryParams {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub vhost: String,
    pub exchange: String,
    pub exchange_type: String,
    pub routing_key: String,
    pub queue: String,
    pub attempts: String,
    pub message: String,
}

impl Default for RawDeliveryParams {
    fn default() -> Self {
        RawDeliveryParams {
            host: String::new(),
            port: DEFAULT_PORT.to_string(),
            username: String::new(),
            password: String::new(),
            vhost: DEFAULT_VHOST.to_owned(),
            exchange: String::new(),
            exchange_type: ExchangeKind::default().to_string(),
            routing_key: String::new(),
            queue: String::new(),
            attempts: DEFAULT_ATTEMPTS.to_string(),
            message: String::new(),
        }
    }
}

impl fmt::Debug for RawDeliveryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDeliveryParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("vhost", &self.vhost)
            .field("exchange", &self.exchange)
            .field("exchange_type", &self.exchange_type)
            .field("routing_key", &self.routing_key)
            .field("queue", &self.queue)
            .field("attempts", &self.attempts)
            .field("message", &self.message)
            .finish()
    }
}

/// One validated delivery: where to connect, what to declare, what to send.
///
/// Fields are private; the value cannot change once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    connection: ConnectionParams,
    exchange_name: String,
    exchange_kind: ExchangeKind,
    routing_key: String,
    queue_name: String,
    message: Vec<u8>,
    max_attempts: u32,
}

impl DeliveryRequest {
    pub fn connection(&self) -> &ConnectionParams {
        &self.connection
    }

    pub fn host(&self) -> &str {
        &self.connection.host
    }

    pub fn port(&self) -> u16 {
        self.connection.port
    }

    pub fn exchange_name(&self) -> &str {
        &self.exchange_name
    }

    pub fn exchange_kind(&self) -> ExchangeKind {
        self.exchange_kind
    }

    /// The routing key as given, possibly empty.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// The queue name as given, possibly empty.
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl TryFrom<RawDeliveryParams> for DeliveryRequest {
    type Error = ValidationError;

    /// Validates raw parameters. Values are trimmed first; the checks run in
    /// this order: mandatory fields, exchange type, routing key or queue,
    /// attempts, port.
    fn try_from(raw: RawDeliveryParams) -> Result<Self, Self::Error> {
        let host = required("host", &raw.host)?;
        let username = required("username", &raw.username)?;
        let password = required("password", &raw.password)?;
        let vhost = required("vhost", &raw.vhost)?;
        let exchange_name = required("exchange", &raw.exchange)?;
        let message = required("message", &raw.message)?;

        let exchange_kind: ExchangeKind = raw.exchange_type.trim().parse()?;

        let routing_key = raw.routing_key.trim().to_owned();
        let queue_name = raw.queue.trim().to_owned();
        if routing_key.is_empty() && queue_name.is_empty() {
            return Err(ValidationError::MissingRoutingKeyAndQueue);
        }

        let attempts = number(&raw.attempts);
        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&attempts) {
            return Err(ValidationError::AttemptsOutOfRange(attempts));
        }

        let port = number(&raw.port);
        if port <= LOWEST_REJECTED_PORT || port > i64::from(u16::MAX) {
            return Err(ValidationError::PortOutOfRange(port));
        }

        Ok(DeliveryRequest {
            connection: ConnectionParams {
                host,
                port: port as u16,
                username,
                password,
                vhost,
            },
            exchange_name,
            exchange_kind,
            routing_key,
            queue_name,
            message: message.into_bytes(),
            max_attempts: attempts as u32,
        })
    }
}

fn required(name: &'static str, value: &str) -> Result<String, ValidationError> {
    match value.trim() {
        "" => Err(ValidationError::MissingField(name)),
        trimmed => Ok(trimmed.to_owned()),
    }
}

fn number(value: &str) -> i64 {
    value.trim().parse().unwrap_or(INVALID_NUMBER)
}
