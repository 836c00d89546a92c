// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

use async_trait::async_trait;
use rabbitmq_sender::{
    broker::{AmqpChannel, AmqpConnection, AmqpConnector, ConnectionParams},
    delivery::MessageSender,
    errors::{AmqpError, ValidationError},
    exchange::{ExchangeDefinition, ExchangeKind},
    queue::{QueueBinding, QueueDefinition},
    report::Outcome,
    request::RawDeliveryParams,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::Instant;

/// Broker-side state shared by every connection of a [`FakeBroker`].
#[derive(Default)]
struct State {
    journal: Vec<String>,
    refused_connections: u32,
    exchanges: HashMap<String, ExchangeKind>,
    last_declared_queue: Option<String>,
    fail_queue_declare: bool,
    fail_publish: bool,
}

/// An in-memory broker that records every call and treats re-declarations
/// with matching attributes as no-ops.
#[derive(Clone, Default)]
struct FakeBroker {
    state: Arc<Mutex<State>>,
}

impl FakeBroker {
    fn refusing(connections: u32) -> FakeBroker {
        let broker = FakeBroker::default();
        broker.state.lock().unwrap().refused_connections = connections;
        broker
    }

    fn record(&self, entry: String) {
        self.state.lock().unwrap().journal.push(entry);
    }

    fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.journal()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl AmqpConnector for FakeBroker {
    async fn connect(
        &self,
        params: &ConnectionParams,
    ) -> Result<Box<dyn AmqpConnection>, AmqpError> {
        self.record(format!("connect {}:{}", params.host, params.port));

        let mut state = self.state.lock().unwrap();
        if state.refused_connections > 0 {
            state.refused_connections -= 1;
            return Err(AmqpError::ConnectAttemptError(format!(
                "Connection refused ({} left)",
                state.refused_connections
            )));
        }

        Ok(Box::new(FakeConnection {
            broker: self.clone(),
        }))
    }
}

struct FakeConnection {
    broker: FakeBroker,
}

#[async_trait]
impl AmqpConnection for FakeConnection {
    async fn create_channel(&self) -> Result<Box<dyn AmqpChannel>, AmqpError> {
        self.broker.record("channel.open".to_owned());
        Ok(Box::new(FakeChannel {
            broker: self.broker.clone(),
        }))
    }

    async fn close(&self) -> Result<(), AmqpError> {
        self.broker.record("connection.close".to_owned());
        Ok(())
    }
}

struct FakeChannel {
    broker: FakeBroker,
}

#[async_trait]
impl AmqpChannel for FakeChannel {
    async fn exchange_declare(&self, def: &ExchangeDefinition) -> Result<(), AmqpError> {
        self.broker.record(format!(
            "exchange.declare {} {} durable={}",
            def.name(),
            def.exchange_kind(),
            def.is_durable()
        ));

        let mut state = self.broker.state.lock().unwrap();
        let existing = state.exchanges.get(def.name()).copied();
        match existing {
            Some(kind) if kind != def.exchange_kind() => Err(AmqpError::DeclareExchangeError {
                name: def.name().to_owned(),
                reason: format!(
                    "PRECONDITION_FAILED - inequivalent arg 'type' for exchange '{}'",
                    def.name()
                ),
            }),
            _ => {
                state
                    .exchanges
                    .insert(def.name().to_owned(), def.exchange_kind());
                Ok(())
            }
        }
    }

    async fn queue_declare(&self, def: &QueueDefinition) -> Result<(), AmqpError> {
        self.broker.record(format!(
            "queue.declare {} durable={} exclusive={} auto_delete={}",
            def.name(),
            def.is_durable(),
            def.is_exclusive(),
            def.is_auto_delete()
        ));

        let mut state = self.broker.state.lock().unwrap();
        if state.fail_queue_declare {
            return Err(AmqpError::DeclareQueueError {
                name: def.name().to_owned(),
                reason: "ACCESS_REFUSED".to_owned(),
            });
        }
        state.last_declared_queue = Some(def.name().to_owned());
        Ok(())
    }

    async fn queue_bind(&self, binding: &QueueBinding) -> Result<(), AmqpError> {
        // an empty queue name refers to the last queue declared on the channel
        let queue = match binding.queue_name() {
            "" => self
                .broker
                .state
                .lock()
                .unwrap()
                .last_declared_queue
                .clone()
                .unwrap_or_default(),
            name => name.to_owned(),
        };

        self.broker.record(format!(
            "queue.bind {} -> {} key={}",
            queue,
            binding.exchange_name(),
            binding.key()
        ));
        Ok(())
    }

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), AmqpError> {
        self.broker.record(format!(
            "publish {} key={} body={}",
            exchange,
            routing_key,
            String::from_utf8_lossy(body)
        ));

        if self.broker.state.lock().unwrap().fail_publish {
            return Err(AmqpError::PublishingError("NOT_FOUND - no exchange".to_owned()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), AmqpError> {
        self.broker.record("channel.close".to_owned());
        Ok(())
    }
}

fn params(exchange: &str, routing_key: &str, queue: &str, message: &str) -> RawDeliveryParams {
    RawDeliveryParams {
        host: "localhost".to_owned(),
        username: "guest".to_owned(),
        password: "guest".to_owned(),
        exchange: exchange.to_owned(),
        routing_key: routing_key.to_owned(),
        queue: queue.to_owned(),
        message: message.to_owned(),
        ..Default::default()
    }
}

fn assert_released_once_in_order(broker: &FakeBroker) {
    let journal = broker.journal();
    let channel_close = journal.iter().position(|e| e == "channel.close");
    let connection_close = journal.iter().position(|e| e == "connection.close");

    assert_eq!(broker.count("channel.close"), 1, "{journal:?}");
    assert_eq!(broker.count("connection.close"), 1, "{journal:?}");
    assert!(channel_close < connection_close, "{journal:?}");
    assert_eq!(journal.last().map(String::as_str), Some("connection.close"));
}

#[tokio::test]
async fn direct_exchange_with_routing_key_only() {
    let broker = FakeBroker::default();

    let outcome = MessageSender::new(broker.clone())
        .send(params("orders", "new", "", "hi"))
        .await;

    assert_eq!(outcome, Outcome::Published);
    assert_eq!(outcome.to_string(), "Message successfully published.");
    assert_eq!(
        broker.journal(),
        vec![
            "connect localhost:5672",
            "channel.open",
            "exchange.declare orders direct durable=false",
            "queue.declare new durable=true exclusive=false auto_delete=false",
            "queue.bind new -> orders key=new",
            "publish orders key=new body=hi",
            "channel.close",
            "connection.close",
        ]
    );
}

#[tokio::test]
async fn queue_only_binds_with_the_queue_name_and_publishes_with_empty_key() {
    let broker = FakeBroker::default();

    let outcome = MessageSender::new(broker.clone())
        .send(RawDeliveryParams {
            exchange_type: "fanout".to_owned(),
            ..params("broadcast", "", "audit", "hello")
        })
        .await;

    assert_eq!(outcome, Outcome::Published);
    let journal = broker.journal();
    assert!(journal.contains(&"exchange.declare broadcast fanout durable=false".to_owned()));
    assert!(journal.contains(&"queue.bind audit -> broadcast key=audit".to_owned()));
    assert!(journal.contains(&"publish broadcast key= body=hello".to_owned()));
}

#[tokio::test]
async fn running_twice_with_identical_parameters_succeeds_both_times() {
    let broker = FakeBroker::default();
    let sender = MessageSender::new(broker.clone());

    let first = sender.send(params("orders", "new", "", "one")).await;
    let second = sender.send(params("orders", "new", "", "two")).await;

    assert_eq!(first, Outcome::Published);
    assert_eq!(second, Outcome::Published);
    assert_eq!(broker.count("publish"), 2);
    assert_eq!(broker.count("channel.close"), 2);
    assert_eq!(broker.count("connection.close"), 2);
}

#[tokio::test]
async fn exchange_type_conflict_is_a_publish_failure_and_still_releases() {
    let broker = FakeBroker::default();
    let sender = MessageSender::new(broker.clone());
    assert_eq!(
        sender.send(params("orders", "new", "", "hi")).await,
        Outcome::Published
    );

    let broker = FakeBroker {
        state: Arc::new(Mutex::new(State {
            exchanges: broker.state.lock().unwrap().exchanges.clone(),
            ..Default::default()
        })),
    };
    let outcome = MessageSender::new(broker.clone())
        .send(RawDeliveryParams {
            exchange_type: "topic".to_owned(),
            ..params("orders", "new", "", "hi")
        })
        .await;

    assert_eq!(
        outcome.to_string(),
        "The message could not be published: failure to declare exchange `orders`: \
         PRECONDITION_FAILED - inequivalent arg 'type' for exchange 'orders'."
    );
    assert_eq!(broker.count("queue.declare"), 0);
    assert_eq!(broker.count("publish"), 0);
    assert_released_once_in_order(&broker);
}

#[tokio::test]
async fn queue_declare_failure_still_releases() {
    let broker = FakeBroker::default();
    broker.state.lock().unwrap().fail_queue_declare = true;

    let outcome = MessageSender::new(broker.clone())
        .send(params("orders", "new", "", "hi"))
        .await;

    assert!(matches!(outcome, Outcome::PublishFailed { .. }));
    assert_eq!(broker.count("queue.bind"), 0);
    assert_released_once_in_order(&broker);
}

#[tokio::test]
async fn publish_failure_still_releases() {
    let broker = FakeBroker::default();
    broker.state.lock().unwrap().fail_publish = true;

    let outcome = MessageSender::new(broker.clone())
        .send(params("orders", "new", "", "hi"))
        .await;

    assert_eq!(
        outcome.to_string(),
        "The message could not be published: failure to publish: NOT_FOUND - no exchange."
    );
    assert_eq!(outcome.exit_code(), 1);
    assert_released_once_in_order(&broker);
}

#[tokio::test]
async fn success_releases_channel_before_connection() {
    let broker = FakeBroker::default();

    MessageSender::new(broker.clone())
        .send(params("orders", "new", "audit", "hi"))
        .await;

    assert_released_once_in_order(&broker);
}

#[tokio::test(start_paused = true)]
async fn unreachable_broker_is_tried_exactly_attempts_times() {
    let broker = FakeBroker::refusing(u32::MAX);
    let start = Instant::now();

    let outcome = MessageSender::new(broker.clone())
        .send(RawDeliveryParams {
            attempts: "3".to_owned(),
            ..params("orders", "new", "", "hi")
        })
        .await;

    assert_eq!(broker.count("connect "), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
    assert_eq!(
        outcome.to_string(),
        format!(
            "Could not connect to RabbitMQ in localhost:5672 after 3 attempts: \
             Connection refused ({} left)",
            u32::MAX - 3
        )
    );
    assert_eq!(broker.count("channel"), 0);
    assert_eq!(broker.count("connection.close"), 0);
}

#[tokio::test(start_paused = true)]
async fn broker_coming_back_within_budget_is_used() {
    let broker = FakeBroker::refusing(2);

    let outcome = MessageSender::new(broker.clone())
        .send(params("orders", "new", "", "hi"))
        .await;

    assert_eq!(outcome, Outcome::Published);
    assert_eq!(broker.count("connect "), 3);
    assert_released_once_in_order(&broker);
}

#[tokio::test]
async fn missing_routing_key_and_queue_never_touches_the_broker() {
    let broker = FakeBroker::default();

    let outcome = MessageSender::new(broker.clone())
        .send(params("orders", "", "", "hi"))
        .await;

    assert_eq!(
        outcome,
        Outcome::Invalid(ValidationError::MissingRoutingKeyAndQueue)
    );
    assert_eq!(outcome.exit_code(), 2);
    assert!(broker.journal().is_empty());
}

#[tokio::test]
async fn custom_retry_delay_is_honoured() {
    let broker = FakeBroker::refusing(1);
    let start = std::time::Instant::now();

    let outcome = MessageSender::new(broker.clone())
        .retry_delay(Duration::from_millis(10))
        .send(params("orders", "new", "", "hi"))
        .await;

    assert_eq!(outcome, Outcome::Published);
    assert!(start.elapsed() < Duration::from_secs(1));
}
