// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Background mode monitor thread.
//!
//! Keeps the [`DriverStation`] cache fresh and tells the control source which
//! mode user code is running.
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------+        +-----------------------------+
//! |   Scheduler thread            |        |   Mode monitor thread       |
//! |                               |        |                             |
//! |   in_mode(id) --------------- reported_mode --> observe_user_program_ |
//! |                               |        |      mode(id)               |
//! |   close() ------------------ keep_alive ---> loop exit              |
//! |                               |        |                             |
//! |                               |        |   wait(private event, T)    |
//! |                               |        |   refresh_data()            |
//! +-------------------------------+        +-----------------------------+
//! ```
//!
//! The private event is registered with the source as a new-data handle, so
//! the loop wakes as soon as a packet lands and at least every timeout `T`
//! otherwise.

use crate::driver_station::DriverStation;
use crate::event::{Event, Interrupt, WaitOutcome};
use crate::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to the running mode monitor thread.
///
/// Dropping the handle stops and joins the thread.
pub struct ModeMonitor {
    keep_alive: Arc<AtomicBool>,
    reported_mode: Arc<AtomicI32>,
    interrupt: Arc<Interrupt>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ModeMonitor {
    /// Spawn the monitor thread.
    ///
    /// `timeout` bounds each wait for new data, and with it both the refresh
    /// period of a quiet link and the latency of [`ModeMonitor::close`].
    pub fn spawn(driver_station: Arc<DriverStation>, timeout: Duration) -> Result<Self> {
        let keep_alive = Arc::new(AtomicBool::new(true));
        let reported_mode = Arc::new(AtomicI32::new(0));
        let interrupt = Arc::new(Interrupt::new());

        let worker = MonitorLoop {
            driver_station,
            timeout,
            keep_alive: Arc::clone(&keep_alive),
            reported_mode: Arc::clone(&reported_mode),
            interrupt: Arc::clone(&interrupt),
        };
        let thread = thread::Builder::new()
            .name("ferrobot-mode-monitor".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            keep_alive,
            reported_mode,
            interrupt,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Record the mode user code is executing, for diagnostics only.
    pub fn in_mode(&self, mode_id: i32) {
        self.reported_mode.store(mode_id, Ordering::Relaxed);
    }

    #[must_use]
    pub fn reported_mode(&self) -> i32 {
        self.reported_mode.load(Ordering::Relaxed)
    }

    /// Whether the thread is still inside its loop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the thread's current and future waits.
    ///
    /// The thread unregisters and releases its event and exits without
    /// another refresh. Call [`ModeMonitor::close`] to join it.
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    /// Stop the loop and join the thread. Later calls are no-ops.
    pub fn close(&self) {
        self.keep_alive.store(false, Ordering::Release);

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::warn!("[MODE-MONITOR] thread panicked before shutdown");
            }
        }
    }
}

impl Drop for ModeMonitor {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ModeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeMonitor")
            .field("keep_alive", &self.keep_alive.load(Ordering::Relaxed))
            .field("reported_mode", &self.reported_mode())
            .finish_non_exhaustive()
    }
}

struct MonitorLoop {
    driver_station: Arc<DriverStation>,
    timeout: Duration,
    keep_alive: Arc<AtomicBool>,
    reported_mode: Arc<AtomicI32>,
    interrupt: Arc<Interrupt>,
}

impl MonitorLoop {
    fn run(self) {
        let event = Event::new(false, false);
        self.driver_station.provide_new_data_event(&event);
        log::debug!(
            "[MODE-MONITOR] started event={} timeout={:?}",
            event.id(),
            self.timeout
        );

        while self.keep_alive.load(Ordering::Acquire) {
            if event.wait_timeout(self.timeout, &self.interrupt) == WaitOutcome::Cancelled {
                log::debug!("[MODE-MONITOR] wait cancelled, exiting");
                self.release(&event);
                return;
            }

            self.driver_station.refresh_data();
            self.driver_station
                .observe_user_program_mode(self.reported_mode.load(Ordering::Relaxed));
        }

        self.release(&event);
        log::debug!("[MODE-MONITOR] stopped");
    }

    fn release(&self, event: &Event) {
        self.driver_station.remove_new_data_event(event);
        event.destroy();
    }
}
