// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal events with bounded, interruptible waits.
//!
//! An [`Event`] is an opaque handle to a signal that producers `set()` and
//! consumers block on with [`Event::wait_timeout`]. Handles are cheap to clone
//! and compare by identity, so the same event can be registered with a data
//! source and later removed again.
//!
//! # Architecture
//! - `Mutex<EventState>` + `Condvar` per event (parking_lot)
//! - Auto-reset events clear on the wake they deliver, manual-reset events
//!   stay signaled until `reset()`
//! - [`Interrupt`] tracks the events a thread is blocked on, so cancellation
//!   wakes the waiter without touching the event's signaled state
//!
//! # Example
//! ```ignore
//! let event = Event::new(false, false);
//! let interrupt = Interrupt::new();
//!
//! // Producer
//! event.set()?;
//!
//! // Consumer
//! match event.wait_timeout(Duration::from_millis(100), &interrupt) {
//!     WaitOutcome::Signaled => refresh(),
//!     WaitOutcome::TimedOut => refresh(), // quiet source, refresh anyway
//!     WaitOutcome::Cancelled => return,
//! }
//! ```

use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The event was set before the deadline.
    Signaled,
    /// The deadline passed without a signal.
    TimedOut,
    /// The waiter was interrupted, or the event was destroyed under it.
    Cancelled,
}

#[derive(Debug)]
struct EventState {
    signaled: bool,
    destroyed: bool,
}

#[derive(Debug)]
struct EventInner {
    id: u64,
    manual_reset: bool,
    state: Mutex<EventState>,
    condvar: Condvar,
}

impl EventInner {
    fn wake_all(&self) {
        let _state = self.state.lock();
        self.condvar.notify_all();
    }
}

/// Handle to a signal event.
///
/// Clones share the same underlying event. Equality is handle identity.
#[derive(Debug, Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Create a new event.
    ///
    /// # Arguments
    /// * `manual_reset` - stay signaled after waking a waiter (until `reset()`)
    /// * `initial_state` - start in the signaled state
    #[must_use]
    pub fn new(manual_reset: bool, initial_state: bool) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        Self {
            inner: Arc::new(EventInner {
                id,
                manual_reset,
                state: Mutex::new(EventState {
                    signaled: initial_state,
                    destroyed: false,
                }),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Unique identifier of this handle.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether the handle can still be signaled and waited on.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.inner.state.lock().destroyed
    }

    /// Whether the event is currently signaled.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.state.lock().signaled
    }

    /// Signal the event, waking blocked waiters.
    ///
    /// Fails with [`Error::EventDestroyed`] once the handle was released.
    pub fn set(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.destroyed {
            return Err(Error::EventDestroyed(self.inner.id));
        }
        state.signaled = true;
        if self.inner.manual_reset {
            self.inner.condvar.notify_all();
        } else {
            self.inner.condvar.notify_one();
        }
        Ok(())
    }

    /// Clear the signaled state.
    pub fn reset(&self) {
        self.inner.state.lock().signaled = false;
    }

    /// Release the event. Blocked waiters return [`WaitOutcome::Cancelled`].
    ///
    /// Destroying twice is a no-op.
    pub fn destroy(&self) {
        let mut state = self.inner.state.lock();
        if state.destroyed {
            return;
        }
        state.destroyed = true;
        state.signaled = false;
        self.inner.condvar.notify_all();
        log::trace!("[EVENT] destroyed id={}", self.inner.id);
    }

    /// Block until the event is set, `timeout` elapses, or `interrupt` fires.
    ///
    /// Cancellation wins over a pending signal so shutdown is never delayed
    /// by a chatty producer.
    pub fn wait_timeout(&self, timeout: Duration, interrupt: &Interrupt) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let _registration = interrupt.register(&self.inner);
        let mut state = self.inner.state.lock();

        loop {
            if interrupt.is_interrupted() || state.destroyed {
                return WaitOutcome::Cancelled;
            }
            if state.signaled {
                if !self.inner.manual_reset {
                    state.signaled = false;
                }
                return WaitOutcome::Signaled;
            }
            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }
            self.inner.condvar.wait_until(&mut state, deadline);
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Event {}

/// Cooperative cancellation token for blocking waits.
///
/// Once interrupted, every current and future wait that uses this token
/// returns [`WaitOutcome::Cancelled`] until [`Interrupt::clear`] is called.
#[derive(Debug, Default)]
pub struct Interrupt {
    flag: AtomicBool,
    waiters: Mutex<Vec<(u64, Weak<EventInner>)>>,
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the interrupt and wake every wait currently using this token.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);

        let waiters = self.waiters.lock();
        for (_, event) in waiters.iter() {
            if let Some(event) = event.upgrade() {
                event.wake_all();
            }
        }
    }

    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Lower the interrupt so later waits block normally again.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    fn register(&self, event: &Arc<EventInner>) -> WaitRegistration<'_> {
        static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);

        self.waiters.lock().push((token, Arc::downgrade(event)));
        WaitRegistration {
            interrupt: self,
            token,
        }
    }
}

struct WaitRegistration<'a> {
    interrupt: &'a Interrupt,
    token: u64,
}

impl Drop for WaitRegistration<'_> {
    fn drop(&mut self) {
        self.interrupt
            .waiters
            .lock()
            .retain(|(token, _)| *token != self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_auto_reset_clears_on_wake() {
        let event = Event::new(false, false);
        let interrupt = Interrupt::new();

        event.set().expect("event is valid");
        assert!(event.is_set());
        assert_eq!(
            event.wait_timeout(Duration::from_millis(10), &interrupt),
            WaitOutcome::Signaled
        );
        assert!(!event.is_set());
        assert_eq!(
            event.wait_timeout(Duration::from_millis(10), &interrupt),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_manual_reset_stays_signaled() {
        let event = Event::new(true, true);
        let interrupt = Interrupt::new();

        for _ in 0..3 {
            assert_eq!(
                event.wait_timeout(Duration::from_millis(10), &interrupt),
                WaitOutcome::Signaled
            );
        }

        event.reset();
        assert_eq!(
            event.wait_timeout(Duration::from_millis(10), &interrupt),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_timeout_without_signal() {
        let event = Event::new(false, false);
        let interrupt = Interrupt::new();

        let start = Instant::now();
        let outcome = event.wait_timeout(Duration::from_millis(30), &interrupt);
        let elapsed = start.elapsed();

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(elapsed >= Duration::from_millis(29), "returned early: {:?}", elapsed);
    }

    #[test]
    fn test_set_wakes_waiter() {
        let event = Event::new(false, false);
        let producer = event.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            producer.set().expect("event is valid");
        });

        let interrupt = Interrupt::new();
        let start = Instant::now();
        let outcome = event.wait_timeout(Duration::from_secs(2), &interrupt);

        assert_eq!(outcome, WaitOutcome::Signaled);
        assert!(start.elapsed() < Duration::from_secs(1), "should wake quickly");
        handle.join().expect("producer thread");
    }

    #[test]
    fn test_interrupt_cancels_blocked_wait() {
        let event = Event::new(false, false);
        let interrupt = Arc::new(Interrupt::new());
        let canceller = Arc::clone(&interrupt);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            canceller.interrupt();
        });

        let start = Instant::now();
        let outcome = event.wait_timeout(Duration::from_secs(5), &interrupt);

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1), "interrupt should be prompt");
        handle.join().expect("canceller thread");
    }

    #[test]
    fn test_interrupt_wins_over_pending_signal_until_cleared() {
        let event = Event::new(false, true);
        let interrupt = Interrupt::new();

        interrupt.interrupt();
        assert_eq!(
            event.wait_timeout(Duration::from_millis(10), &interrupt),
            WaitOutcome::Cancelled
        );
        // The signal was not consumed by the cancelled wait.
        assert!(event.is_set());

        interrupt.clear();
        assert_eq!(
            event.wait_timeout(Duration::from_millis(10), &interrupt),
            WaitOutcome::Signaled
        );
    }

    #[test]
    fn test_destroy_invalidates_handle() {
        let event = Event::new(false, false);
        let clone = event.clone();
        assert!(event.is_valid());

        event.destroy();
        event.destroy();

        assert!(!clone.is_valid());
        assert!(matches!(clone.set(), Err(Error::EventDestroyed(id)) if id == event.id()));
        assert_eq!(
            clone.wait_timeout(Duration::from_millis(10), &Interrupt::new()),
            WaitOutcome::Cancelled
        );
    }

    #[test]
    fn test_destroy_wakes_blocked_waiter() {
        let event = Event::new(false, false);
        let destroyer = event.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            destroyer.destroy();
        });

        let outcome = event.wait_timeout(Duration::from_secs(5), &Interrupt::new());
        assert_eq!(outcome, WaitOutcome::Cancelled);
        handle.join().expect("destroyer thread");
    }

    #[test]
    fn test_identity_equality() {
        let a = Event::new(false, false);
        let b = Event::new(false, false);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_registration_released_after_wait() {
        let event = Event::new(false, true);
        let interrupt = Interrupt::new();

        let _ = event.wait_timeout(Duration::from_millis(1), &interrupt);
        assert!(interrupt.waiters.lock().is_empty());
    }
}
