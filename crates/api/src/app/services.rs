use std::sync::{Arc, Mutex};

use tracing::info;

use warehub_events::{Broker, InMemoryBroker};
use warehub_infra::{
    Aggregator, Config, Emitter, EmitterSpec, InMemoryInventoryStore, InventoryStore, ProvisionError,
    ResponseListener, TopicProvisioner, WorkerHandle,
};
#[cfg(feature = "redis")]
use warehub_infra::broker::RedisStreamsBroker;

/// Everything the HTTP layer needs, plus ownership of the background workers.
pub struct AppServices {
    store: Arc<dyn InventoryStore>,
    workers: Mutex<Vec<WorkerHandle>>,
}

impl AppServices {
    /// Services over an existing store with no background workers.
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self::with_workers(store, Vec::new())
    }

    pub fn with_workers(store: Arc<dyn InventoryStore>, workers: Vec<WorkerHandle>) -> Self {
        Self {
            store,
            workers: Mutex::new(workers),
        }
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    /// Stop and join all background workers. Blocks; idempotent.
    pub fn shutdown(&self) {
        let workers = match self.workers.lock() {
            Ok(mut w) => std::mem::take(&mut *w),
            Err(_) => return,
        };
        for w in workers {
            let name = w.name();
            w.shutdown();
            info!(worker = name, "worker stopped");
        }
    }
}

/// Pick the broker from config, provision topics and start all workers.
///
/// Provisioning failures abort startup.
pub fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let store = Arc::new(InMemoryInventoryStore::new());

    let workers = match config.redis_url.as_deref() {
        #[cfg(feature = "redis")]
        Some(url) => {
            info!("using Redis Streams broker");
            let broker = Arc::new(RedisStreamsBroker::new(url)?);
            start_pipeline(config, broker, store.clone())?
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            tracing::warn!("REDIS_URL is set but the redis feature is disabled; using in-memory broker");
            start_pipeline(config, Arc::new(InMemoryBroker::new()), store.clone())?
        }
        None => {
            info!("using in-memory broker");
            start_pipeline(config, Arc::new(InMemoryBroker::new()), store.clone())?
        }
    };

    Ok(AppServices::with_workers(store, workers))
}

/// Wire provisioner, aggregator, emitters and response listener to `broker`.
pub fn start_pipeline<B, S>(config: &Config, broker: Arc<B>, store: Arc<S>) -> Result<Vec<WorkerHandle>, ProvisionError>
where
    B: Broker + 'static,
    S: InventoryStore + 'static,
{
    TopicProvisioner::from_config(config).provision(&broker)?;

    let mut workers = Vec::new();

    // Fresh group per start: this instance always gets the whole stream.
    let group = config.aggregator_group();
    workers.push(
        Aggregator::new(store, broker.clone(), config.response_topic.clone()).spawn(&config.data_topic, &group),
    );

    workers.push(ResponseListener::spawn(&broker, &config.response_topic, &config.response_group));

    for spec in EmitterSpec::defaults(config) {
        workers.push(Emitter::spawn(spec, broker.clone(), config.data_topic.clone()));
    }

    Ok(workers)
}
