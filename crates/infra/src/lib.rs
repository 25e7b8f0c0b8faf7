//! Infrastructure layer: store, workers, broker adapters, config.

pub mod aggregator;
pub mod broker;
pub mod config;
pub mod emitter;
pub mod provisioner;
pub mod store;
pub mod workers;


pub use aggregator::{Aggregator, AggregatorError};
pub use config::{Config, ConfigError};
pub use emitter::{Completion, Emitter, EmitterError, EmitterSpec, ResponseListener};
pub use provisioner::{ProvisionError, TopicProvisioner};
pub use store::{InMemoryInventoryStore, InventoryStore, StoreError};
pub use workers::WorkerHandle;
