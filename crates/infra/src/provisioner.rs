//! Startup topic declarations.

use thiserror::Error;
use tracing::info;

use warehub_events::{Broker, TopicSpec};

use crate::config::Config;

#[derive(Debug, Error)]
#[error("failed to provision topic {topic}: {source}")]
pub struct ProvisionError {
    pub topic: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Declares the fixed set of topics the system uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicProvisioner {
    specs: Vec<TopicSpec>,
}

impl TopicProvisioner {
    pub fn new(specs: Vec<TopicSpec>) -> Self {
        Self { specs }
    }

    /// Data and response topics, one partition and one replica each.
    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            TopicSpec::single(config.response_topic.clone()),
            TopicSpec::single(config.data_topic.clone()),
        ])
    }

    pub fn specs(&self) -> &[TopicSpec] {
        &self.specs
    }

    /// Declare every topic in order. Stops at the first failure; not retried.
    pub fn provision<B: Broker>(&self, broker: &B) -> Result<(), ProvisionError> {
        for spec in &self.specs {
            broker.provision(spec).map_err(|e| ProvisionError {
                topic: spec.name.clone(),
                source: Box::new(e),
            })?;
            info!(topic = %spec.name, partitions = spec.partitions, replicas = spec.replicas, "topic provisioned");
        }
        Ok(())
    }
}
