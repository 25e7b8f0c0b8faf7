//! Central aggregator: final-data topic -> inventory store -> acknowledgment.

use thiserror::Error;
use tracing::{debug, info};

use warehub_core::{ACKNOWLEDGMENT, GroupId, WarehouseKey};
use warehub_events::{Broker, Record};

use crate::store::{InventoryStore, StoreError};
use crate::workers::{SubscriptionWorker, WorkerHandle};

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),

    #[error("acknowledgment publish failed: {0}")]
    Publish(String),
}

/// Consumes inventory records and keeps the latest one per warehouse.
///
/// Processing is best-effort: a record whose store write or acknowledgment
/// fails is logged and dropped, never redelivered.
#[derive(Debug)]
pub struct Aggregator<S, B> {
    store: S,
    broker: B,
    response_topic: String,
}

impl<S, B> Aggregator<S, B>
where
    S: InventoryStore,
    B: Broker,
{
    pub fn new(store: S, broker: B, response_topic: impl Into<String>) -> Self {
        Self {
            store,
            broker,
            response_topic: response_topic.into(),
        }
    }

    /// Classify, store, acknowledge.
    pub fn handle(&self, payload: &str) -> Result<WarehouseKey, AggregatorError> {
        let key = WarehouseKey::classify(payload);
        self.store.put(key, payload.to_string())?;

        let ack = self
            .broker
            .publish(&self.response_topic, ACKNOWLEDGMENT.to_string())
            .map_err(|e| AggregatorError::Publish(e.to_string()))?;
        debug!(topic = %ack.topic, offset = ack.offset, "acknowledgment published");

        Ok(key)
    }

    /// Entry point for a delivered record.
    pub fn process(&self, record: &Record) -> Result<WarehouseKey, AggregatorError> {
        info!(topic = %record.topic, offset = record.offset, payload = %record.payload, "inventory record received");
        let key = self.handle(&record.payload)?;
        info!(warehouse = %key, offset = record.offset, "inventory record stored");
        Ok(key)
    }
}

impl<S, B> Aggregator<S, B>
where
    S: InventoryStore + 'static,
    B: Broker + 'static,
{
    /// Subscribe to `topic` under `group` and process records on a worker thread.
    ///
    /// Pass a per-process random group (see [`GroupId::random`]) so every
    /// instance receives the full stream instead of sharing it.
    pub fn spawn(self, topic: &str, group: &GroupId) -> WorkerHandle {
        let sub = self.broker.subscribe(topic, group);
        info!(%topic, %group, "aggregator subscribed");

        SubscriptionWorker::spawn("warehub.aggregator", sub, move |record: Record| {
            self.process(&record).map(|_| ())
        })
    }
}
