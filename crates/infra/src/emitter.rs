//! Warehouse nodes: timer-driven record emitters and the acknowledgment listener.

use std::time::Duration;

use thiserror::Error;
use tracing::info;

use warehub_core::{DomainError, GroupId, InventoryRecord};
use warehub_events::{Broker, Record, RecordMetadata};

use crate::config::Config;
use crate::workers::{FixedRateWorker, SubscriptionWorker, WorkerHandle};

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("invalid record: {0}")]
    Record(#[from] DomainError),

    #[error("publish failed: {0}")]
    Publish(String),
}

/// What an emitter does once a publish completes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Log topic and offset on success; failures are dropped silently.
    LogOffset,
    /// Fire and forget.
    Ignore,
}

/// One simulated warehouse node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterSpec {
    pub name: &'static str,
    pub warehouse: String,
    pub item: String,
    pub count: i64,
    pub interval: Duration,
    pub completion: Completion,
}

impl EmitterSpec {
    pub fn linz(interval: Duration) -> Self {
        Self {
            name: "warehub.emitter.linz",
            warehouse: "Linz".to_string(),
            item: "Reifen".to_string(),
            count: 40,
            interval,
            completion: Completion::LogOffset,
        }
    }

    pub fn wien(interval: Duration) -> Self {
        Self {
            name: "warehub.emitter.wien",
            warehouse: "Wien".to_string(),
            item: "Felgen".to_string(),
            count: 100,
            interval,
            completion: Completion::Ignore,
        }
    }

    /// Both default nodes with the configured intervals.
    pub fn defaults(config: &Config) -> Vec<Self> {
        vec![Self::linz(config.linz_interval), Self::wien(config.wien_interval)]
    }

    pub fn record(&self) -> Result<InventoryRecord, DomainError> {
        InventoryRecord::for_warehouse(&self.warehouse, self.item.clone(), self.count)
    }

    /// Build and publish one record.
    pub fn emit_once<B: Broker>(&self, broker: &B, topic: &str) -> Result<RecordMetadata, EmitterError> {
        let payload = self.record()?.to_payload()?;
        broker
            .publish(topic, payload)
            .map_err(|e| EmitterError::Publish(e.to_string()))
    }
}

/// Spawns emitters on their own fixed-rate timers.
#[derive(Debug)]
pub struct Emitter;

impl Emitter {
    pub fn spawn<B>(spec: EmitterSpec, broker: B, topic: impl Into<String>) -> WorkerHandle
    where
        B: Broker + 'static,
    {
        let topic = topic.into();
        let name = spec.name;
        let interval = spec.interval;

        FixedRateWorker::spawn(name, interval, move || {
            let result = spec.emit_once(&broker, &topic);
            if let (Completion::LogOffset, Ok(meta)) = (spec.completion, result) {
                info!(warehouse = %spec.warehouse, topic = %meta.topic, offset = meta.offset, "record sent");
            }
        })
    }
}

/// Logs every acknowledgment arriving on the response topic.
///
/// Purely observational; it has no influence on the emit timers.
#[derive(Debug)]
pub struct ResponseListener;

impl ResponseListener {
    pub fn spawn<B>(broker: &B, topic: &str, group: &GroupId) -> WorkerHandle
    where
        B: Broker,
    {
        let sub = broker.subscribe(topic, group);
        info!(%topic, %group, "response listener subscribed");

        SubscriptionWorker::spawn("warehub.responses", sub, |record: Record| {
            info!(response = %record.payload, offset = record.offset, "acknowledgment received");
            Ok::<(), std::convert::Infallible>(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use warehub_core::{ACKNOWLEDGMENT, WarehouseKey};
    use warehub_events::{InMemoryBroker, TopicSpec};

    const DATA: &str = "warehouse-final-topic";

    fn broker() -> Arc<InMemoryBroker> {
        let broker = Arc::new(InMemoryBroker::new());
        broker.provision(&TopicSpec::single(DATA)).unwrap();
        broker
    }

    #[test]
    fn default_specs_match_the_two_nodes() {
        let specs = EmitterSpec::defaults(&Config::default());
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].interval, Duration::from_secs(10));
        assert_eq!(specs[0].completion, Completion::LogOffset);
        assert_eq!(specs[1].interval, Duration::from_secs(15));
        assert_eq!(specs[1].completion, Completion::Ignore);
    }

    #[test]
    fn emit_once_publishes_classifiable_payload() {
        let broker = broker();
        let sub = broker.subscribe(DATA, &GroupId::fixed("test"));

        let meta = EmitterSpec::wien(Duration::from_secs(15)).emit_once(&broker, DATA).unwrap();
        let rec = sub.try_recv().unwrap();

        assert_eq!(meta.offset, 0);
        assert_eq!(rec.payload, r#"{"id":"Warehouse_Wien","item":"Felgen","count":100}"#);
        assert_eq!(WarehouseKey::classify(&rec.payload), WarehouseKey::Wien);
    }

    #[test]
    fn emit_to_missing_topic_is_an_error() {
        let broker = Arc::new(InMemoryBroker::new());
        let err = EmitterSpec::linz(Duration::from_secs(10)).emit_once(&broker, DATA).unwrap_err();
        assert!(matches!(err, EmitterError::Publish(_)));
    }

    #[test]
    fn spawned_emitter_keeps_publishing() {
        let broker = broker();
        let sub = broker.subscribe(DATA, &GroupId::fixed("test"));
        let handle = Emitter::spawn(EmitterSpec::linz(Duration::from_millis(20)), broker.clone(), DATA);

        let first = sub.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = sub.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.shutdown();

        assert_eq!(first.payload, second.payload);
        assert_eq!(second.offset, first.offset + 1);
    }

    #[test]
    fn failing_publishes_do_not_stop_the_timer() {
        // Topic is never declared: every publish fails, the timer keeps going.
        let broker = Arc::new(InMemoryBroker::new());
        let handle = Emitter::spawn(EmitterSpec::linz(Duration::from_millis(10)), broker.clone(), DATA);
        std::thread::sleep(Duration::from_millis(50));

        broker.provision(&TopicSpec::single(DATA)).unwrap();
        let sub = broker.subscribe(DATA, &GroupId::fixed("late"));
        let rec = sub.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.shutdown();

        assert!(rec.payload.contains("Linz"));
    }

    #[test]
    fn response_listener_takes_its_share_and_stops_on_shutdown() {
        const RESPONSES: &str = "warehouse-responses";
        let broker = Arc::new(InMemoryBroker::new());
        broker.provision(&TopicSpec::single(RESPONSES)).unwrap();
        let group = GroupId::fixed("final-lager-group");

        // Listener joins first, so round-robin hands it the first ack.
        let listener = ResponseListener::spawn(&broker, RESPONSES, &group);
        let peer = broker.subscribe(RESPONSES, &group);

        for _ in 0..3 {
            broker.publish(RESPONSES, ACKNOWLEDGMENT.to_string()).unwrap();
        }
        let only = peer.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(only.offset, 1);
        assert!(peer.try_recv().is_err());

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            listener.shutdown();
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(3)).is_ok());

        // With the listener gone, the peer receives everything.
        broker.publish(RESPONSES, ACKNOWLEDGMENT.to_string()).unwrap();
        broker.publish(RESPONSES, ACKNOWLEDGMENT.to_string()).unwrap();
        assert_eq!(peer.recv_timeout(Duration::from_secs(1)).unwrap().offset, 3);
        assert_eq!(peer.recv_timeout(Duration::from_secs(1)).unwrap().offset, 4);
    }
}
