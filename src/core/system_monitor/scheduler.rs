//! Periodic sampling scheduler.
//!
//! Owns a small Tokio runtime that ticks at a fixed interval, runs one
//! collection cycle per tick and publishes the result through a watch
//! channel. Publishing is a single `send_replace` of an `Arc`, so readers
//! only ever see complete snapshots.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::error::{MonitorError, Result};

use super::collector::MetricsCollector;
use super::metrics::SystemSnapshot;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Latest published snapshot, `None` until the first cycle completes.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<SystemSnapshot>>>;

/// Where the sampling loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Sampling = 1,
    Published = 2,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Sampling,
            2 => SchedulerState::Published,
            _ => SchedulerState::Idle,
        }
    }
}

/// State shared between the scheduler handle and its sampling loop.
struct Shared {
    collector: Mutex<MetricsCollector>,
    snapshot_tx: watch::Sender<Option<Arc<SystemSnapshot>>>,
    state: AtomicU8,
    cycles_completed: AtomicU64,
}

impl Shared {
    fn set_state(&self, state: SchedulerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// The running loop and the runtime hosting it.
struct ActiveLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    runtime: tokio::runtime::Runtime,
}

/// Drives a [`MetricsCollector`] on a fixed interval and publishes snapshots.
///
/// `start` builds its own runtime; readers may call `current_snapshot`
/// from any thread at any time.
pub struct SamplingScheduler {
    shared: Arc<Shared>,
    snapshot_rx: SnapshotReceiver,
    active: Option<ActiveLoop>,
}

impl SamplingScheduler {
    pub fn new(collector: MetricsCollector) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                collector: Mutex::new(collector),
                snapshot_tx,
                state: AtomicU8::new(SchedulerState::Idle as u8),
                cycles_completed: AtomicU64::new(0),
            }),
            snapshot_rx,
            active: None,
        }
    }

    /// Spawn the sampling loop. The first cycle runs immediately.
    pub fn start(&mut self, period: Duration) -> Result<()> {
        if self.active.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }
        if period.is_zero() {
            return Err(MonitorError::config("sampling interval must be non-zero"));
        }

        log::info!("Starting sampling scheduler ({} ms interval)", period.as_millis());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("sysmon-sampler")
            .build()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(sampling_loop(self.shared.clone(), period, shutdown_rx));

        self.active = Some(ActiveLoop {
            shutdown_tx,
            handle,
            runtime,
        });
        Ok(())
    }

    /// Stop sampling and wait for the loop to exit.
    ///
    /// A cycle in flight runs to completion first. Calling `stop` on a
    /// stopped scheduler is a no-op. Safe to call (or drop the scheduler)
    /// from inside another async runtime.
    pub fn stop(&mut self) {
        let Some(ActiveLoop {
            shutdown_tx,
            handle,
            runtime,
        }) = self.active.take()
        else {
            return;
        };

        log::info!("Stopping sampling scheduler");
        let _ = shutdown_tx.send(true);

        // The runtime is dropped at the end of this closure, wherever it runs
        let wait = move || runtime.block_on(handle);
        let finished = if tokio::runtime::Handle::try_current().is_ok() {
            // Blocking on or dropping a runtime inside another one panics
            match std::thread::spawn(wait).join() {
                Ok(result) => result,
                Err(_) => {
                    log::error!("Scheduler shutdown thread panicked");
                    Ok(())
                }
            }
        } else {
            wait()
        };

        if let Err(e) = finished {
            log::error!("Sampling loop ended abnormally: {}", e);
        }
        self.shared.set_state(SchedulerState::Idle);
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Most recently published snapshot. Never blocks on a running cycle.
    pub fn current_snapshot(&self) -> Option<Arc<SystemSnapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver for consumers that want to be woken on each publish.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn cycles_completed(&self) -> u64 {
        self.shared.cycles_completed.load(Ordering::Acquire)
    }
}

impl Drop for SamplingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Idle -> Sampling -> Published -> Idle, once per tick.
///
/// Shutdown is only observed while idle, and ticks missed during a slow
/// cycle are skipped rather than queued.
async fn sampling_loop(
    shared: Arc<Shared>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(&shared, period).await;
            }
            _ = shutdown.changed() => {
                log::debug!("Sampling loop shutting down");
                break;
            }
        }
    }
}

async fn run_cycle(shared: &Arc<Shared>, period: Duration) {
    shared.set_state(SchedulerState::Sampling);
    let started = Instant::now();

    let worker = shared.clone();
    let collected = tokio::task::spawn_blocking(move || {
        let mut collector = worker.collector.lock();
        collector.collect()
    })
    .await;

    match collected {
        Ok(snapshot) => {
            shared.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
            shared.cycles_completed.fetch_add(1, Ordering::AcqRel);
            shared.set_state(SchedulerState::Published);
            log::trace!("Snapshot published");
        }
        Err(e) => {
            // The previous snapshot stays current; try again next tick
            log::error!("Sampling cycle failed: {}", e);
        }
    }

    let elapsed = started.elapsed();
    if elapsed > period {
        log::debug!(
            "Sampling cycle took {} ms, longer than the {} ms interval; skipping missed ticks",
            elapsed.as_millis(),
            period.as_millis()
        );
    }

    shared.set_state(SchedulerState::Idle);
}
