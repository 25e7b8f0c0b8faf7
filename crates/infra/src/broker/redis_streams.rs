//! Redis Streams-backed broker.
//!
//! - **Topic**: one Redis stream per topic name
//! - **Declaration**: `<topic>:spec` hash holding partitions/replicas; the
//!   stream itself is created with `XGROUP CREATE ... MKSTREAM`
//! - **Offsets**: `<topic>:offset` counter, stored on each entry
//! - **Groups**: one Redis consumer group per [`GroupId`]; members of a group
//!   share entries, distinct groups each see every entry
//! - **Delivery**: entries are `XACK`ed as soon as they are handed to the
//!   subscriber, so a failing handler loses the record (no redelivery)
//!
//! Redis has no notion of partitions or replicas; the declared values are
//! recorded only so re-declarations can be checked for conflicts.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use redis::Commands;
use redis::streams::{StreamReadOptions, StreamReadReply};
use tracing::{debug, error, instrument, warn};

use warehub_core::GroupId;
use warehub_events::{Broker, Record, RecordMetadata, SubscriberLiveness, Subscription, TopicSpec};

/// Group used only to materialise the stream at declaration time.
const PROVISIONER_GROUP: &str = "warehub-provisioner";

/// Entries fetched per `XREADGROUP`.
const READ_COUNT: usize = 10;

/// `XREADGROUP` block timeout.
const BLOCK_MS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum RedisBrokerError {
    #[error("Redis connection error: {0}")]
    Connection(String),

    #[error("Redis command error: {0}")]
    Command(String),

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("topic {name} already declared as {existing_partitions}p/{existing_replicas}r")]
    TopicConflict {
        name: String,
        existing_partitions: u32,
        existing_replicas: u16,
    },
}

#[derive(Debug, Clone)]
pub struct RedisStreamsBroker {
    client: redis::Client,
}

impl RedisStreamsBroker {
    /// Open a client for `redis_url` (e.g. "redis://localhost:6379").
    ///
    /// No connection is made until the first command.
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, RedisBrokerError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisBrokerError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    fn connection(&self) -> Result<redis::Connection, RedisBrokerError> {
        self.client
            .get_connection()
            .map_err(|e| RedisBrokerError::Connection(e.to_string()))
    }

    fn spec_key(topic: &str) -> String {
        format!("{topic}:spec")
    }

    fn offset_key(topic: &str) -> String {
        format!("{topic}:offset")
    }

    /// Create `group` on `topic` (and the stream if missing). Idempotent.
    fn ensure_group(conn: &mut redis::Connection, topic: &str, group: &str) -> Result<(), RedisBrokerError> {
        let created: redis::RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(topic)
            .arg(group)
            .arg("$")
            .arg("MKSTREAM")
            .query(conn);

        match created {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(RedisBrokerError::Command(format!("XGROUP CREATE failed: {e}"))),
        }
    }
}

impl Broker for RedisStreamsBroker {
    type Error = RedisBrokerError;

    #[instrument(skip(self), fields(topic = %spec.name), err)]
    fn provision(&self, spec: &TopicSpec) -> Result<(), Self::Error> {
        let mut conn = self.connection()?;
        let spec_key = Self::spec_key(&spec.name);

        let existing: HashMap<String, String> = conn
            .hgetall(&spec_key)
            .map_err(|e| RedisBrokerError::Command(format!("HGETALL failed: {e}")))?;

        if !existing.is_empty() {
            let partitions = existing.get("partitions").and_then(|v| v.parse().ok()).unwrap_or(0);
            let replicas = existing.get("replicas").and_then(|v| v.parse().ok()).unwrap_or(0);
            if partitions == spec.partitions && replicas == spec.replicas {
                return Ok(());
            }
            return Err(RedisBrokerError::TopicConflict {
                name: spec.name.clone(),
                existing_partitions: partitions,
                existing_replicas: replicas,
            });
        }

        Self::ensure_group(&mut conn, &spec.name, PROVISIONER_GROUP)?;

        let _: () = conn
            .hset_multiple(
                &spec_key,
                &[
                    ("partitions", spec.partitions.to_string()),
                    ("replicas", spec.replicas.to_string()),
                    ("declared_at", chrono::Utc::now().to_rfc3339()),
                ],
            )
            .map_err(|e| RedisBrokerError::Command(format!("HSET failed: {e}")))?;

        Ok(())
    }

    #[instrument(skip(self, payload), err)]
    fn publish(&self, topic: &str, payload: String) -> Result<RecordMetadata, Self::Error> {
        let mut conn = self.connection()?;

        let declared: bool = conn
            .exists(Self::spec_key(topic))
            .map_err(|e| RedisBrokerError::Command(format!("EXISTS failed: {e}")))?;
        if !declared {
            return Err(RedisBrokerError::UnknownTopic(topic.to_string()));
        }

        // Counter and XADD are separate round trips; concurrent publishers may
        // append in a different order than their offsets.
        let next: u64 = conn
            .incr(Self::offset_key(topic), 1)
            .map_err(|e| RedisBrokerError::Command(format!("INCR failed: {e}")))?;
        let offset = next - 1;

        let _: String = conn
            .xadd(topic, "*", &[("offset", offset.to_string()), ("payload", payload)])
            .map_err(|e| RedisBrokerError::Command(format!("XADD failed: {e}")))?;

        Ok(RecordMetadata {
            topic: topic.to_string(),
            partition: 0,
            offset,
        })
    }

    fn subscribe(&self, topic: &str, group: &GroupId) -> Subscription<Record> {
        let (tx, rx) = mpsc::channel();

        // The group must exist before we return, or records published in the
        // meantime would be skipped by the `$` start id.
        let mut conn = match self.connection() {
            Ok(c) => c,
            Err(e) => {
                error!(%topic, %group, error = %e, "subscribe failed");
                return Subscription::new(rx);
            }
        };
        if let Err(e) = Self::ensure_group(&mut conn, topic, group.as_str()) {
            error!(%topic, %group, error = %e, "subscribe failed");
            return Subscription::new(rx);
        }

        let topic = topic.to_string();
        let group = group.as_str().to_string();
        let consumer = format!("consumer-{}", uuid::Uuid::now_v7());
        let (subscription, liveness) = Subscription::with_liveness(rx);

        // Background thread that reads the consumer group and forwards records.
        thread::spawn(move || read_loop(conn, topic, group, consumer, tx, liveness));

        subscription
    }
}

fn read_loop(
    mut conn: redis::Connection,
    topic: String,
    group: String,
    consumer: String,
    tx: mpsc::Sender<Record>,
    liveness: SubscriberLiveness,
) {
    let opts = StreamReadOptions::default()
        .group(&group, &consumer)
        .count(READ_COUNT)
        .block(BLOCK_MS);

    // Checked before every blocking read so an idle stream cannot keep the
    // thread and its connection alive after the subscriber is gone.
    loop {
        if liveness.is_dropped() {
            debug!(%topic, %group, "subscriber dropped; read loop stopped");
            return;
        }

        let reply: Option<StreamReadReply> = match conn.xread_options(&[&topic], &[">"], &opts) {
            Ok(r) => r,
            Err(e) => {
                error!(%topic, %group, error = %e, "XREADGROUP failed; subscription closed");
                return;
            }
        };

        let Some(reply) = reply else {
            continue;
        };

        for entry in reply.keys.into_iter().flat_map(|k| k.ids) {
            let ack: redis::RedisResult<i64> = conn.xack(&topic, &group, &[&entry.id]);
            if let Err(e) = ack {
                warn!(%topic, id = %entry.id, error = %e, "XACK failed");
            }

            let Some(payload) = entry.get::<String>("payload") else {
                debug!(%topic, id = %entry.id, "entry without payload skipped");
                continue;
            };
            let record = Record {
                topic: topic.clone(),
                partition: 0,
                offset: entry.get::<u64>("offset").unwrap_or_default(),
                payload,
            };

            if tx.send(record).is_err() {
                return;
            }
        }
    }
}
