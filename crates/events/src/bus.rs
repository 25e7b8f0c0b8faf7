//! Publish/subscribe abstraction over a topic-based broker.
//!
//! ## Delivery model
//!
//! - Topics are declared up front via [`Broker::provision`].
//! - Subscribers attach to a topic under a [`GroupId`]. Subscribers sharing a
//!   group split the records between them; each distinct group receives every
//!   record (broadcast).
//! - Delivery is best-effort. Nothing here retries or redelivers; a handler
//!   that fails simply loses the record.
//!
//! ```text
//! Emitter ──publish──▶ topic ──┬──▶ group "zentrale-final-<uuid>" ──▶ Aggregator
//!                              └──▶ group "<other instance>"      ──▶ Aggregator
//! ```

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Weak};
use std::time::Duration;

use warehub_core::GroupId;

use crate::topic::{Record, RecordMetadata, TopicSpec};

/// A subscription to a topic.
///
/// Subscriptions are designed for single-threaded consumption: hand each one
/// to exactly one worker thread.
///
/// ```ignore
/// let sub = broker.subscribe("warehouse-final-topic", &group);
/// loop {
///     match sub.recv_timeout(Duration::from_millis(250)) {
///         Ok(record) => handle(record),
///         Err(RecvTimeoutError::Timeout) => continue,  // check for shutdown
///         Err(RecvTimeoutError::Disconnected) => break, // broker gone
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
    _alive: Option<Arc<()>>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self {
            receiver,
            _alive: None,
        }
    }

    /// Subscription plus a handle the producing side can poll to notice the
    /// subscriber went away while no records are flowing.
    pub fn with_liveness(receiver: Receiver<M>) -> (Self, SubscriberLiveness) {
        let alive = Arc::new(());
        let liveness = SubscriberLiveness(Arc::downgrade(&alive));
        (
            Self {
                receiver,
                _alive: Some(alive),
            },
            liveness,
        )
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Producer-side view of whether a [`Subscription`] still exists.
#[derive(Debug, Clone)]
pub struct SubscriberLiveness(Weak<()>);

impl SubscriberLiveness {
    pub fn is_dropped(&self) -> bool {
        self.0.strong_count() == 0
    }
}

/// Broker client binding.
///
/// Implementations must be `Send + Sync`: emitters, the aggregator and the
/// response listener all publish from their own threads through one shared
/// handle.
pub trait Broker: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Declare a topic. Re-declaring with identical parameters is a no-op.
    fn provision(&self, spec: &TopicSpec) -> Result<(), Self::Error>;

    /// Append `payload` to `topic`.
    fn publish(&self, topic: &str, payload: String) -> Result<RecordMetadata, Self::Error>;

    /// Receive records published to `topic` from now on, under `group`.
    fn subscribe(&self, topic: &str, group: &GroupId) -> Subscription<Record>;
}

impl<B> Broker for Arc<B>
where
    B: Broker + ?Sized,
{
    type Error = B::Error;

    fn provision(&self, spec: &TopicSpec) -> Result<(), Self::Error> {
        (**self).provision(spec)
    }

    fn publish(&self, topic: &str, payload: String) -> Result<RecordMetadata, Self::Error> {
        (**self).publish(topic, payload)
    }

    fn subscribe(&self, topic: &str, group: &GroupId) -> Subscription<Record> {
        (**self).subscribe(topic, group)
    }
}
