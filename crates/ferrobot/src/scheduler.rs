// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Competition mode scheduler.
//!
//! Drives user code through disabled / autonomous / teleop / test in step
//! with the driver station. Entry callbacks are edge-triggered: each fires
//! once when its category becomes current and not again until the category
//! has changed and changed back.
//!
//! # Lifecycle
//!
//! ```text
//! NotStarted --run()--> Starting --first dispatch--> Running(category)
//!                                                        |   ^
//!                                                        +---+ category change
//!                                                        |
//!                                     end_competition() -+--> Terminated
//! ```
//!
//! # Startup order
//! 1. spawn the [`ModeMonitor`]
//! 2. create the data-ready event and register it for refreshed data
//! 3. register the autonomous / teleop / test mode options
//! 4. announce "user program starting"
//!
//! Shutdown runs the reverse: unregister the data-ready event, release it,
//! then stop and join the monitor.
//!
//! # Example
//!
//! ```rust,no_run
//! use ferrobot::{
//!     CompetitionRobot, CompetitionScheduler, DriverStation, SchedulerConfig, SimDriverStation,
//! };
//! use std::sync::Arc;
//!
//! struct Robot;
//!
//! impl CompetitionRobot for Robot {
//!     fn on_autonomous(&mut self) {
//!         println!("auto started");
//!     }
//! }
//!
//! let sim = Arc::new(SimDriverStation::new());
//! let ds = Arc::new(DriverStation::new(sim));
//! let scheduler = CompetitionScheduler::new(ds, SchedulerConfig::default())?;
//! let handle = scheduler.handle();
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//!     handle.end_competition();
//! });
//! scheduler.run(&mut Robot)?;
//! # Ok::<(), ferrobot::Error>(())
//! ```

use crate::config::{SchedulerConfig, DISABLED_MODE_ID};
use crate::driver_station::DriverStation;
use crate::event::{Event, Interrupt, WaitOutcome};
use crate::monitor::ModeMonitor;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Coarse execution state of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Disabled,
    Autonomous,
    Teleop,
    Test,
}

impl Category {
    /// Invoke the entry callback for this category.
    fn enter<R: CompetitionRobot + ?Sized>(self, robot: &mut R) {
        match self {
            Category::Disabled => robot.on_disabled(),
            Category::Autonomous => robot.on_autonomous(),
            Category::Teleop => robot.on_teleop(),
            Category::Test => robot.on_test(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Disabled => "disabled",
            Category::Autonomous => "autonomous",
            Category::Teleop => "teleop",
            Category::Test => "test",
        };
        f.write_str(name)
    }
}

/// Ids the control source assigned to the scheduler's mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeIds {
    pub autonomous: i32,
    pub teleop: i32,
    pub test: i32,
}

impl ModeIds {
    /// Category registered under `mode_id`, if any. 0 is always disabled.
    #[must_use]
    pub fn category_of(&self, mode_id: i32) -> Option<Category> {
        if mode_id == DISABLED_MODE_ID {
            Some(Category::Disabled)
        } else if mode_id == self.autonomous {
            Some(Category::Autonomous)
        } else if mode_id == self.teleop {
            Some(Category::Teleop)
        } else if mode_id == self.test {
            Some(Category::Test)
        } else {
            None
        }
    }
}

/// Map a mode id onto a category.
///
/// Ids that match nothing keep `previous` (the control link can report
/// transient ids while attaching or detaching); with no previous category
/// they count as disabled.
#[must_use]
pub fn classify(mode_id: i32, ids: &ModeIds, previous: Option<Category>) -> Category {
    ids.category_of(mode_id)
        .or(previous)
        .unwrap_or(Category::Disabled)
}

/// User mode handlers.
///
/// Each method runs once per transition into its category, on the scheduler
/// thread, and should return promptly. Steady-state work belongs to whatever
/// the handler schedules, not to the handler itself.
pub trait CompetitionRobot {
    fn on_disabled(&mut self) {}
    fn on_autonomous(&mut self) {}
    fn on_teleop(&mut self) {}
    fn on_test(&mut self) {}
}

/// Observable scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// `run()` has not been called.
    NotStarted,
    /// Startup sequence in progress, nothing dispatched yet.
    Starting,
    /// Last dispatched category.
    Running(Category),
    /// Loop exited; the scheduler cannot be restarted.
    Terminated,
}

struct Shared {
    exit: AtomicBool,
    interrupt: Interrupt,
    state: Mutex<SchedulerState>,
    mode_ids: Mutex<Option<ModeIds>>,
}

impl Shared {
    fn is_cancelled(&self) -> bool {
        self.exit.load(Ordering::Acquire) || self.interrupt.is_interrupted()
    }

    fn set_state(&self, state: SchedulerState) {
        *self.state.lock() = state;
    }
}

/// Cloneable, thread-safe handle for ending and observing a scheduler.
#[derive(Clone)]
pub struct CompetitionHandle {
    shared: Arc<Shared>,
}

impl CompetitionHandle {
    /// Ask the scheduler loop to exit.
    ///
    /// Wakes the loop's current wait; a handler that is running finishes
    /// first. Safe to call before `run()`, in which case no handler fires.
    pub fn end_competition(&self) {
        self.shared.exit.store(true, Ordering::Release);
        self.shared.interrupt.interrupt();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    /// Ids assigned during startup, once registration finished.
    #[must_use]
    pub fn mode_ids(&self) -> Option<ModeIds> {
        *self.shared.mode_ids.lock()
    }
}

impl fmt::Debug for CompetitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompetitionHandle")
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// The main-thread mode dispatch loop.
pub struct CompetitionScheduler {
    driver_station: Arc<DriverStation>,
    config: SchedulerConfig,
    shared: Arc<Shared>,
}

impl CompetitionScheduler {
    /// Create a scheduler. Nothing starts until [`CompetitionScheduler::run`].
    pub fn new(driver_station: Arc<DriverStation>, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            driver_station,
            config,
            shared: Arc::new(Shared {
                exit: AtomicBool::new(false),
                interrupt: Interrupt::new(),
                state: Mutex::new(SchedulerState::NotStarted),
                mode_ids: Mutex::new(None),
            }),
        })
    }

    #[must_use]
    pub fn handle(&self) -> CompetitionHandle {
        CompetitionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Same as [`CompetitionHandle::end_competition`].
    pub fn end_competition(&self) {
        self.handle().end_competition();
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run the competition until `end_competition()` is called.
    ///
    /// Blocks the calling thread. Fails only during startup; a scheduler
    /// runs at most once.
    pub fn run<R: CompetitionRobot + ?Sized>(&self, robot: &mut R) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if *state != SchedulerState::NotStarted {
                return Err(Error::AlreadyStarted);
            }
            *state = SchedulerState::Starting;
        }

        let result = self.start().map(|session| {
            self.dispatch(robot, &session);
            log::info!("[SCHEDULER] competition ended");
            // Drop order of the session enforces the shutdown sequence.
            drop(session);
        });

        self.shared.set_state(SchedulerState::Terminated);
        result
    }

    fn start(&self) -> Result<Session> {
        let monitor = ModeMonitor::spawn(
            Arc::clone(&self.driver_station),
            self.config.monitor_timeout,
        )?;

        let data_ready = Event::new(false, false);
        self.driver_station.provide_refreshed_data_event(&data_ready);

        let mut session = Session {
            shared: Arc::clone(&self.shared),
            driver_station: Arc::clone(&self.driver_station),
            data_ready,
            monitor,
            ids: ModeIds {
                autonomous: -1,
                teleop: -1,
                test: -1,
            },
        };

        let ids = ModeIds {
            autonomous: self.register_mode(&self.config.autonomous_mode)?,
            teleop: self.register_mode(&self.config.teleop_mode)?,
            test: self.register_mode(&self.config.test_mode)?,
        };
        session.ids = ids;
        *self.shared.mode_ids.lock() = Some(ids);

        self.driver_station.observe_user_program_starting();
        log::info!(
            "[SCHEDULER] ready: auto={} teleop={} test={}",
            ids.autonomous,
            ids.teleop,
            ids.test
        );

        Ok(session)
    }

    fn register_mode(&self, name: &str) -> Result<i32> {
        let id = self.driver_station.add_mode_option(name, "", "", 0);
        if id <= DISABLED_MODE_ID {
            return Err(Error::ModeRegistration {
                name: name.to_string(),
                id,
            });
        }
        Ok(id)
    }

    fn dispatch<R: CompetitionRobot + ?Sized>(&self, robot: &mut R, session: &Session) {
        let ds = &self.driver_station;
        let ids = &session.ids;
        let mut entered: Option<Category> = None;

        while !self.shared.is_cancelled() {
            let mode_id = ds.mode_id();
            session.monitor.in_mode(mode_id);

            let category = classify(mode_id, ids, entered);
            if ids.category_of(mode_id).is_none() {
                log::warn!(
                    "[SCHEDULER] unknown mode id {}, staying in {}",
                    mode_id,
                    category
                );
            }

            if entered != Some(category) {
                log::info!("[SCHEDULER] entering {} (mode id {})", category, mode_id);
                self.shared.set_state(SchedulerState::Running(category));
                category.enter(robot);
                entered = Some(category);
            }

            while !self.shared.is_cancelled()
                && classify(ds.mode_id(), ids, entered) == category
            {
                match session
                    .data_ready
                    .wait_timeout(self.config.data_wait_timeout, &self.shared.interrupt)
                {
                    WaitOutcome::Signaled | WaitOutcome::TimedOut => {}
                    WaitOutcome::Cancelled => {
                        log::debug!("[SCHEDULER] wait cancelled, rechecking exit");
                        break;
                    }
                }
            }
        }
    }
}

impl fmt::Debug for CompetitionScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompetitionScheduler")
            .field("config", &self.config)
            .field("state", &*self.shared.state.lock())
            .finish_non_exhaustive()
    }
}

/// Resources held while the loop runs.
///
/// Released on drop (including unwinding out of a handler) in the only safe
/// order: unregister the data-ready event, release it, join the monitor.
struct Session {
    shared: Arc<Shared>,
    driver_station: Arc<DriverStation>,
    data_ready: Event,
    monitor: ModeMonitor,
    ids: ModeIds,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.driver_station
            .remove_refreshed_data_event(&self.data_ready);
        self.data_ready.destroy();
        self.monitor.interrupt();
        self.monitor.close();
        self.shared.set_state(SchedulerState::Terminated);
    }
}
