use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::WorkerHandle;

/// Shortest interval a timer will run at; smaller values are raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-rate timer: runs `tick` immediately, then once per `interval`.
///
/// The cadence is anchored to the start time. A slow tick does not push later
/// ticks back; missed ticks are skipped rather than replayed. Intervals below
/// [`MIN_INTERVAL`] (including zero) are clamped to it.
#[derive(Debug)]
pub struct FixedRateWorker;

impl FixedRateWorker {
    pub fn spawn<F>(name: &'static str, interval: Duration, mut tick: F) -> WorkerHandle
    where
        F: FnMut() + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || timer_loop(name, interval, shutdown_rx, &mut tick))
            .expect("failed to spawn fixed-rate worker thread");

        WorkerHandle::new(name, shutdown_tx, join)
    }
}

fn timer_loop<F>(name: &'static str, interval: Duration, shutdown_rx: mpsc::Receiver<()>, tick: &mut F)
where
    F: FnMut(),
{
    debug!(worker = name, interval_ms = interval.as_millis() as u64, "timer started");

    let mut next_tick = Instant::now();

    loop {
        let now = Instant::now();
        if now >= next_tick {
            tick();
            // Keep a stable cadence even if we were delayed.
            while next_tick <= Instant::now() {
                next_tick += interval;
            }
        }

        let wait = next_tick.saturating_duration_since(Instant::now());
        match shutdown_rx.recv_timeout(wait) {
            Ok(()) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            // Handle dropped without a shutdown request: keep ticking.
            Err(mpsc::RecvTimeoutError::Disconnected) => thread::sleep(wait),
        }
    }

    debug!(worker = name, "timer stopped");
}
