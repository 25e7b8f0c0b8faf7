//! Broker client binding: topics, records, subscriptions.
//!
//! The broker itself (storage, partitioning, rebalancing) is external. This
//! crate only defines the contract the warehouse nodes talk to, plus an
//! in-memory implementation for tests and single-process runs.

pub mod bus;
pub mod in_memory_bus;
pub mod topic;

pub use bus::{Broker, SubscriberLiveness, Subscription};
pub use in_memory_bus::{InMemoryBroker, InMemoryBrokerError};
pub use topic::{Record, RecordMetadata, TopicSpec};
