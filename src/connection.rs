// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Connection Management
//!
//! [`connect`] opens the broker connection for a [`DeliveryRequest`], retrying
//! with a fixed delay until the request's attempt budget is spent. Each
//! attempt is cut off after [`CONNECT_TIMEOUT`] and counts as a failed one.
//!
//! The open connection is owned by an [`AmqpSession`] together with the single
//! channel derived from it. [`AmqpSession::close`] releases the channel and then
//! the connection; it consumes the session, so the pair is released at most
//! once.

use crate::{
    broker::{AmqpChannel, AmqpConnection, AmqpConnector},
    errors::AmqpError,
    request::DeliveryRequest,
    retry::{retry_fixed, RetryPolicy},
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Upper bound for one connection attempt, TCP connect and AMQP handshake
/// included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Exclusive owner of one broker connection and at most one channel.
pub struct AmqpSession {
    connection: Box<dyn AmqpConnection>,
    channel: Option<Box<dyn AmqpChannel>>,
    closed: bool,
}

impl AmqpSession {
    pub fn new(connection: Box<dyn AmqpConnection>) -> AmqpSession {
        AmqpSession {
            connection,
            channel: None,
            closed: false,
        }
    }

    /// Returns the session's channel, creating it on first use.
    pub async fn channel(&mut self) -> Result<&dyn AmqpChannel, AmqpError> {
        let channel = match self.channel.take() {
            Some(channel) => channel,
            None => self.connection.create_channel().await?,
        };

        Ok(&**self.channel.insert(channel))
    }

    /// Closes the channel, if one was opened, then the connection.
    ///
    /// Both are always attempted. The first failure is returned.
    pub async fn close(mut self) -> Result<(), AmqpError> {
        self.closed = true;

        let channel_closed = match self.channel.take() {
            Some(channel) => {
                debug!("closing amqp channel...");
                channel.close().await
            }
            None => Ok(()),
        };

        debug!("closing amqp connection...");
        let connection_closed = self.connection.close().await;

        channel_closed.and(connection_closed)
    }
}

impl Drop for AmqpSession {
    fn drop(&mut self) {
        if !self.closed {
            error!("amqp session dropped without being closed");
        }
    }
}

/// Opens a connection for `request`, making up to `request.max_attempts()`
/// attempts spaced by `delay`.
///
/// On exhaustion the returned [`AmqpError::ConnectionError`] names the host,
/// the port, the number of attempts and the reason of the last failure.
pub async fn connect(
    connector: &dyn AmqpConnector,
    request: &DeliveryRequest,
    delay: Duration,
) -> Result<AmqpSession, AmqpError> {
    let params = request.connection();
    let policy = RetryPolicy::new(request.max_attempts(), delay);

    let connection = retry_fixed(&policy, |attempt| async move {
        debug!(
            attempt,
            host = %params.host,
            port = params.port,
            "connecting to rabbitmq"
        );
        match timeout(CONNECT_TIMEOUT, connector.connect(params)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(attempt, "connection attempt timed out");
                Err(AmqpError::ConnectAttemptError(format!(
                    "no answer from the broker within {}s",
                    CONNECT_TIMEOUT.as_secs()
                )))
            }
        }
    })
    .await
    .map_err(|exhausted| AmqpError::ConnectionError {
        host: params.host.clone(),
        port: params.port,
        attempts: exhausted.attempts,
        reason: exhausted.last_error.reason().to_owned(),
    })?;

    info!(host = %params.host, port = params.port, "connected to rabbitmq");
    Ok(AmqpSession::new(connection))
}
