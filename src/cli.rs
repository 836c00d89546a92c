// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Command-line arguments.
//!
//! Every option accepts `-x=value` as well as `-x value`. Connection
//! parameters can also be taken from the environment. Numbers are kept as
//! text here and checked by the validator, so `-a=many` is reported as an
//! out-of-range attempt count rather than a parse error.

use crate::{
    errors::ValidationError,
    request::{RawDeliveryParams, DEFAULT_ATTEMPTS, DEFAULT_PORT, DEFAULT_VHOST},
};
use clap::{error::ErrorKind, ArgAction, Parser};
use std::ffi::OsString;

/// Publishes one text message to a RabbitMQ exchange
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rabbitmq-sender")]
#[command(about = "Publishes one text message to a RabbitMQ exchange", long_about = None)]
#[command(version, disable_help_flag = true)]
pub struct SenderArgs {
    /// Host name or IP address of the broker
    #[arg(short = 'h', long, env = "RABBITMQ_HOST", default_value = "")]
    pub host: String,

    /// Port to connect to, greater than 1024
    #[arg(short = 'n', long, env = "RABBITMQ_PORT", default_value_t = DEFAULT_PORT.to_string())]
    pub port: String,

    /// User name used to authenticate
    #[arg(short = 'u', long, env = "RABBITMQ_USER", default_value = "")]
    pub username: String,

    /// Password used to authenticate
    #[arg(
        short = 'p',
        long,
        env = "RABBITMQ_PASSWORD",
        hide_env_values = true,
        default_value = ""
    )]
    pub password: String,

    /// Virtual host
    #[arg(short = 'v', long, env = "RABBITMQ_VHOST", default_value = DEFAULT_VHOST)]
    pub vhost: String,

    /// Exchange that receives the message
    #[arg(short = 'e', long, default_value = "")]
    pub exchange: String,

    /// Routing key; when blank the queue name is used for the binding
    #[arg(short = 'r', long, default_value = "")]
    pub routing_key: String,

    /// Queue name; when blank the routing key is used
    #[arg(short = 'q', long, default_value = "")]
    pub queue: String,

    /// Exchange type: direct, fanout or topic
    #[arg(short = 't', long = "type", default_value = "direct")]
    pub exchange_type: String,

    /// Connection attempts, between 1 and 30
    #[arg(short = 'a', long, default_value_t = DEFAULT_ATTEMPTS.to_string())]
    pub attempts: String,

    /// Text message to deliver
    #[arg(short = 'm', long, default_value = "")]
    pub message: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

/// Parses the process arguments. See [`parse_args_from`].
pub fn parse_args() -> Result<SenderArgs, ValidationError> {
    parse_args_from(std::env::args_os())
}

/// Parses `args`, program name first.
///
/// `--help` and `--version` print and exit the process. Any other parse
/// failure, such as an unknown flag, becomes
/// [`ValidationError::InvalidArgument`] with clap's one-line description.
pub fn parse_args_from<I, T>(args: I) -> Result<SenderArgs, ValidationError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    SenderArgs::try_parse_from(args).or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            let rendered = err.to_string();
            let summary = rendered.lines().next().unwrap_or_default();
            Err(ValidationError::InvalidArgument(
                summary.trim_start_matches("error: ").to_owned(),
            ))
        }
    })
}

impl From<SenderArgs> for RawDeliveryParams {
    fn from(args: SenderArgs) -> Self {
        RawDeliveryParams {
            host: args.host,
            port: args.port,
            username: args.username,
            password: args.password,
            vhost: args.vhost,
            exchange: args.exchange,
            exchange_type: args.exchange_type,
            routing_key: args.routing_key,
            queue: args.queue,
            attempts: args.attempts,
            message: args.message,
        }
    }
}
