// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Delivers one text message to a RabbitMQ exchange: connects with bounded
//! retry, declares the exchange, the queue and their binding, publishes, and
//! always releases the channel and the connection.

pub mod broker;
pub mod channel;
pub mod cli;
pub mod connection;
pub mod delivery;
pub mod errors;
pub mod exchange;
pub mod logging;
pub mod publisher;
pub mod queue;
pub mod report;
pub mod request;
pub mod retry;
pub mod topology;
