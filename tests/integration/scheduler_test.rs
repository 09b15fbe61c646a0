use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sysmon::core::system_monitor::{SamplingScheduler, SchedulerState};
use sysmon::{MonitorError, Reading};

use super::support::{collector_for, FakeHost, HostState};

const PERIOD: Duration = Duration::from_millis(20);

/// Poll until `condition` holds or the deadline passes
fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_no_snapshot_before_start() {
    let scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    assert!(scheduler.current_snapshot().is_none());
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.state(), SchedulerState::Idle);
    assert_eq!(scheduler.cycles_completed(), 0);
}

#[test]
fn test_start_publishes_snapshots() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    scheduler.start(PERIOD).unwrap();
    assert!(scheduler.is_running());

    assert!(wait_for(Duration::from_secs(5), || scheduler
        .current_snapshot()
        .is_some_and(|s| s.sequence >= 3)));
    assert!(scheduler.cycles_completed() >= 3);

    let snapshot = scheduler.current_snapshot().unwrap();
    assert_eq!(snapshot.memory_percent, Reading::Available(75.0));

    scheduler.stop();
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[test]
fn test_start_twice_is_rejected() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    scheduler.start(PERIOD).unwrap();

    let err = scheduler.start(PERIOD).unwrap_err();
    assert!(matches!(err, MonitorError::AlreadyRunning));

    scheduler.stop();
}

#[test]
fn test_zero_interval_is_rejected() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    assert!(scheduler.start(Duration::ZERO).is_err());
    assert!(!scheduler.is_running());
}

#[test]
fn test_stop_is_idempotent_and_restartable() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    scheduler.stop();

    scheduler.start(PERIOD).unwrap();
    assert!(wait_for(Duration::from_secs(5), || scheduler
        .current_snapshot()
        .is_some()));
    scheduler.stop();
    scheduler.stop();

    let before_restart = scheduler.cycles_completed();
    scheduler.start(PERIOD).unwrap();
    assert!(wait_for(Duration::from_secs(5), || scheduler
        .cycles_completed()
        > before_restart));
    scheduler.stop();
}

#[test]
fn test_no_publication_after_stop() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    scheduler.start(PERIOD).unwrap();
    assert!(wait_for(Duration::from_secs(5), || scheduler
        .cycles_completed()
        >= 2));
    scheduler.stop();

    let cycles = scheduler.cycles_completed();
    let sequence = scheduler.current_snapshot().unwrap().sequence;
    thread::sleep(PERIOD * 5);

    assert_eq!(scheduler.cycles_completed(), cycles);
    assert_eq!(scheduler.current_snapshot().unwrap().sequence, sequence);
}

#[test]
fn test_snapshot_survives_stop() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    scheduler.start(PERIOD).unwrap();
    assert!(wait_for(Duration::from_secs(5), || scheduler
        .current_snapshot()
        .is_some()));

    let held = scheduler.current_snapshot().unwrap();
    scheduler.stop();
    drop(scheduler);

    // Readers own their snapshot independently of the scheduler
    assert!(held.sequence >= 1);
}

#[test]
fn test_concurrent_readers_see_consistent_snapshots() {
    let host = FakeHost::with_state(HostState {
        cpu_load: 0.0,
        cpu_step: 7.0,
        counter_step: 1_000,
        ..Default::default()
    });
    let mut scheduler = SamplingScheduler::new(collector_for(&host));
    scheduler.start(Duration::from_millis(5)).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let rx = scheduler.subscribe();
            let done = done.clone();
            thread::spawn(move || {
                let mut last_sequence = 0;
                let mut checked = 0;
                while !done.load(Ordering::Relaxed) {
                    let current = rx.borrow().clone();
                    if let Some(snapshot) = current {
                        // Sequences never go backwards for a single reader
                        assert!(snapshot.sequence >= last_sequence);
                        last_sequence = snapshot.sequence;

                        // The newest history point is this snapshot's CPU reading
                        let cpu = snapshot.cpu_percent.value().unwrap();
                        assert_eq!(snapshot.cpu_history.last().copied(), Some(cpu));
                        checked += 1;
                    }
                    thread::yield_now();
                }
                checked
            })
        })
        .collect();

    assert!(wait_for(Duration::from_secs(5), || scheduler
        .cycles_completed()
        >= 20));
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    scheduler.stop();
}

#[test]
fn test_slow_cycles_do_not_overlap() {
    let host = FakeHost::new();
    *host.cpu_delay.lock() = Duration::from_millis(30);
    let mut scheduler = SamplingScheduler::new(collector_for(&host));

    let started = Instant::now();
    scheduler.start(Duration::from_millis(5)).unwrap();
    assert!(wait_for(Duration::from_secs(5), || scheduler
        .cycles_completed()
        >= 3));
    scheduler.stop();
    let elapsed = started.elapsed();

    // Cycles run one at a time, so each completed one cost a full delay
    let cycles = scheduler.cycles_completed() as u32;
    assert!(elapsed >= Duration::from_millis(30) * cycles);

    // Sequence numbers stay contiguous with the cycle count
    assert_eq!(
        scheduler.current_snapshot().unwrap().sequence,
        scheduler.cycles_completed()
    );
}

#[test]
fn test_subscriber_is_woken_on_publish() {
    let mut scheduler = SamplingScheduler::new(collector_for(&FakeHost::new()));
    let mut rx = scheduler.subscribe();
    scheduler.start(PERIOD).unwrap();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let sequence = runtime.block_on(async {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("no snapshot published")
            .unwrap();
        rx.borrow().as_ref().map(|s| s.sequence)
    });
    assert!(sequence.is_some_and(|s| s >= 1));

    scheduler.stop();
}

#[test]
fn test_stop_lets_in_flight_cycle_finish() {
    let host = FakeHost::new();
    *host.cpu_delay.lock() = Duration::from_millis(300);
    let mut scheduler = SamplingScheduler::new(collector_for(&host));
    scheduler.start(Duration::from_secs(10)).unwrap();

    assert!(wait_for(Duration::from_secs(5), || scheduler.state()
        == SchedulerState::Sampling));
    scheduler.stop();

    // The cycle that was running when stop was requested still published
    assert_eq!(scheduler.cycles_completed(), 1);
    assert_eq!(scheduler.current_snapshot().unwrap().sequence, 1);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}
