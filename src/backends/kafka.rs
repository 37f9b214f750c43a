// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - Kafka Backend

//! # Kafka Telemetry Backend
//!
//! Production transport for telemetry events. Envelopes are published to a
//! single topic as JSON strings with no message key, so broker default
//! partitioning applies.
//!
//! The producer is configured for strict fire-and-forget: `acks=0`, gzip
//! compression, one transport-level retry, and a bounded delivery timeout.
//! Delivery outcomes arrive on the client's own poll thread via
//! [`rdkafka::producer::ProducerContext::delivery`]; a failure there invokes
//! the lifecycle manager's hook, which tears the client down so the next
//! event triggers reconnection.

use crate::backends::traits::{EventSink, FailureHook, SinkConnector};
use crate::config::TelemetryConfig;
use crate::errors::{Error, Result};
use crate::metrics_constants::METRIC_DELIVERY_FAILURES_TOTAL;
use prometheus::Counter;
use rdkafka::config::ClientConfig;
use rdkafka::message::Message;
use rdkafka::producer::{BaseRecord, Producer, ProducerContext, ThreadedProducer};
use rdkafka::util::Timeout;
use rdkafka::ClientContext;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info, trace, warn};

static DELIVERY_FAILURES_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    crate::metrics_utils::counter(
        METRIC_DELIVERY_FAILURES_TOTAL,
        "Total number of asynchronous delivery failures reported by the client",
    )
});

/// Timeout for the flush performed by [`EventSink::close`].
/// With `acks=0` the local queue drains quickly; 2 seconds is generous.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for the flush attempted on drop.
///
/// Zero keeps `Drop` non-blocking; `close()` does the bounded flush on the
/// orderly teardown paths.
const DROP_FLUSH_TIMEOUT: Duration = Duration::from_millis(0);

/// Pick a `broker.address.family` value for the given bootstrap list.
///
/// Localhost-style addresses default to `v4` to avoid IPv6 resolution issues
/// with Docker-advertised brokers; anything else is left to librdkafka.
#[must_use]
pub fn broker_address_family(brokers: &str) -> &'static str {
    let localhost = brokers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .all(|broker| {
            let host = broker.rsplit_once(':').map_or(broker, |(h, _)| h);
            matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
        });
    if localhost {
        "v4"
    } else {
        "any"
    }
}

/// Client context that routes delivery outcomes into the lifecycle manager.
struct DeliveryHook {
    on_failure: FailureHook,
}

impl ClientContext for DeliveryHook {
    fn error(&self, error: rdkafka::error::KafkaError, reason: &str) {
        // Connection-level errors; the per-message delivery callback decides
        // whether the client gets torn down.
        warn!(error = %error, reason, "Kafka client error");
    }
}

impl ProducerContext for DeliveryHook {
    type DeliveryOpaque = ();

    fn delivery(
        &self,
        delivery_result: &rdkafka::message::DeliveryResult<'_>,
        _delivery_opaque: Self::DeliveryOpaque,
    ) {
        match delivery_result {
            Ok(message) => {
                trace!(
                    partition = message.partition(),
                    offset = message.offset(),
                    "event delivered"
                );
            }
            Err((err, _message)) => {
                DELIVERY_FAILURES_TOTAL.inc();
                error!(error = %err, "event delivery failed; invalidating producer");
                (self.on_failure)();
            }
        }
    }
}

/// A live Kafka producer bound to one topic.
pub struct KafkaSink {
    producer: ThreadedProducer<DeliveryHook>,
    topic: String,
}

impl EventSink for KafkaSink {
    fn enqueue(&self, payload: &str) -> Result<()> {
        let record: BaseRecord<'_, (), str> = BaseRecord::to(&self.topic).payload(payload);
        self.producer
            .send(record)
            .map_err(|(err, _record)| Error::Enqueue(err.to_string()))
    }

    fn close(&self) {
        if let Err(err) = self.producer.flush(Timeout::After(CLOSE_FLUSH_TIMEOUT)) {
            warn!(error = %err, "flush on close did not complete");
        }
        info!("Kafka producer closed");
    }
}

impl Drop for KafkaSink {
    /// Best-effort non-blocking flush on drop.
    ///
    /// A blocking flush here could stall a game-server thread during
    /// teardown; the orderly paths go through `close()` instead.
    fn drop(&mut self) {
        let _ = self.producer.flush(Timeout::After(DROP_FLUSH_TIMEOUT));
    }
}

/// Connector producing [`KafkaSink`]s for one configured broker set + topic.
pub struct KafkaConnector {
    config: TelemetryConfig,
}

impl KafkaConnector {
    /// Create a connector from validated configuration.
    pub fn new(config: TelemetryConfig) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self { config })
    }

    /// The configured topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// The configured build identifier.
    #[must_use]
    pub fn build(&self) -> &str {
        &self.config.build
    }

    fn client_config(&self) -> ClientConfig {
        let send_timeout_ms = self
            .config
            .send_timeout
            .as_millis()
            .min(i32::MAX as u128)
            .to_string();

        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.config.brokers)
            // Fire-and-forget at the transport level: never wait for acks.
            .set("acks", "0")
            .set("compression.type", "gzip")
            // One transport-level retry; lost messages are acceptable here,
            // leaked producers are not.
            .set("retries", "1")
            .set("client.id", format!("parlor-{}", self.config.build))
            .set("message.timeout.ms", send_timeout_ms)
            .set(
                "broker.address.family",
                broker_address_family(&self.config.brokers),
            );
        client_config
    }
}

impl SinkConnector for KafkaConnector {
    type Sink = KafkaSink;

    fn connect(&self, on_delivery_failure: FailureHook) -> Result<KafkaSink> {
        let context = DeliveryHook {
            on_failure: on_delivery_failure,
        };
        let producer: ThreadedProducer<DeliveryHook> = self
            .client_config()
            .create_with_context(context)
            .map_err(|e| Error::Connect(e.to_string()))?;

        // Liveness probe: a client that cannot fetch partition metadata for
        // the topic is not ready.
        let metadata = producer
            .client()
            .fetch_metadata(
                Some(&self.config.topic),
                Timeout::After(self.config.connect_timeout),
            )
            .map_err(|e| Error::Metadata(e.to_string()))?;

        let topic_metadata = metadata
            .topics()
            .iter()
            .find(|t| t.name() == self.config.topic)
            .ok_or_else(|| {
                Error::Metadata(format!("topic {} missing from metadata", self.config.topic))
            })?;
        if let Some(err) = topic_metadata.error() {
            return Err(Error::Metadata(format!(
                "topic {} metadata error: {:?}",
                self.config.topic, err
            )));
        }
        if topic_metadata.partitions().is_empty() {
            return Err(Error::Metadata(format!(
                "topic {} has no partitions",
                self.config.topic
            )));
        }
        info!(
            topic = %self.config.topic,
            partitions = topic_metadata.partitions().len(),
            "Kafka producer connected"
        );

        Ok(KafkaSink {
            producer,
            topic: self.config.topic.clone(),
        })
    }
}
