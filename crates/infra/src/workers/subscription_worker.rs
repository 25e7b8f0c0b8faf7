use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use warehub_events::{Record, Subscription};

use super::WorkerHandle;

/// Generic best-effort subscription loop.
///
/// - Applies `handler` to every record of one subscription
/// - Handler failures are logged and the record is dropped (no redelivery)
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct SubscriptionWorker;

impl SubscriptionWorker {
    /// Spawn a named worker thread that drains `sub`.
    pub fn spawn<H, E>(name: &'static str, sub: Subscription<Record>, mut handler: H) -> WorkerHandle
    where
        H: FnMut(Record) -> Result<(), E> + Send + 'static,
        E: core::fmt::Display + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut handler))
            .expect("failed to spawn subscription worker thread");

        WorkerHandle::new(name, shutdown_tx, join)
    }
}

fn worker_loop<H, E>(name: &'static str, sub: Subscription<Record>, shutdown_rx: mpsc::Receiver<()>, handler: &mut H)
where
    H: FnMut(Record) -> Result<(), E>,
    E: core::fmt::Display,
{
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(record) => {
                let (topic, offset) = (record.topic.clone(), record.offset);
                if let Err(err) = handler(record) {
                    warn!(worker = name, %topic, offset, error = %err, "record dropped after handler failure");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                debug!(worker = name, "subscription closed");
                break;
            }
        }
    }
}
