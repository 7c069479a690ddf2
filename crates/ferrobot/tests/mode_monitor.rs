// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Mode monitor refresh cadence and shutdown behavior.

use ferrobot::{
    ControlWord, DriverStation, Event, Interrupt, ModeMonitor, SimDriverStation, WaitOutcome,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn setup() -> (Arc<SimDriverStation>, Arc<DriverStation>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let sim = Arc::new(SimDriverStation::new());
    let ds = Arc::new(DriverStation::new(sim.clone()));
    (sim, ds)
}

#[test]
fn test_quiet_source_refreshes_at_timeout_cadence() {
    let (_sim, ds) = setup();
    let monitor = ModeMonitor::spawn(Arc::clone(&ds), Duration::from_millis(100)).expect("spawn");

    thread::sleep(Duration::from_millis(500));
    let refreshes = ds.refresh_count();
    monitor.close();

    // ~5 expected; leave room for scheduler jitter on loaded CI hosts.
    assert!(
        (3..=7).contains(&refreshes),
        "expected about 5 refreshes in 500ms, got {}",
        refreshes
    );
}

#[test]
fn test_burst_of_new_data_refreshes_promptly() {
    let (sim, ds) = setup();
    let monitor = ModeMonitor::spawn(Arc::clone(&ds), Duration::from_secs(10)).expect("spawn");

    let deadline = Instant::now() + Duration::from_secs(2);
    while sim.new_data_event_count() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }

    for mode_id in 1..=5 {
        sim.set_mode_id(mode_id);
        sim.notify_new_data();
        while ds.mode_id() != mode_id && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(ds.mode_id(), mode_id);
    }

    monitor.interrupt();
    monitor.close();
}

#[test]
fn test_unreachable_source_keeps_last_snapshot() {
    let (sim, ds) = setup();
    sim.set_emergency_stop(true);
    sim.set_mode_id(2);

    let monitor = ModeMonitor::spawn(Arc::clone(&ds), Duration::from_millis(10)).expect("spawn");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(ds.mode_id(), 2);

    sim.set_reachable(false);
    sim.set_emergency_stop(false);
    sim.set_mode_id(0);
    let before = ds.refresh_count();
    thread::sleep(Duration::from_millis(50));
    monitor.close();

    assert!(ds.refresh_count() > before, "monitor keeps trying while unreachable");
    assert_eq!(ds.mode_id(), 2);
    assert_eq!(ds.control_word(), ControlWord::new(true, false, false));
}

#[test]
fn test_refreshed_data_event_follows_monitor() {
    let (sim, ds) = setup();
    let refreshed = Event::new(false, false);
    ds.provide_refreshed_data_event(&refreshed);

    let monitor = ModeMonitor::spawn(Arc::clone(&ds), Duration::from_secs(10)).expect("spawn");
    let interrupt = Interrupt::new();

    let deadline = Instant::now() + Duration::from_secs(2);
    while sim.new_data_event_count() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    sim.notify_new_data();

    assert_eq!(
        refreshed.wait_timeout(Duration::from_secs(2), &interrupt),
        WaitOutcome::Signaled
    );

    monitor.interrupt();
    monitor.close();
    ds.remove_refreshed_data_event(&refreshed);
    refreshed.destroy();
}

#[test]
fn test_close_latency_bounded_by_timeout() {
    let (sim, ds) = setup();
    let monitor = ModeMonitor::spawn(ds, Duration::from_millis(50)).expect("spawn");
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    monitor.close();
    // One 50ms wait at most, with headroom for thread wake-up.
    assert!(
        started.elapsed() < Duration::from_millis(150),
        "close took {:?}",
        started.elapsed()
    );
    assert_eq!(sim.new_data_event_count(), 0);
}
