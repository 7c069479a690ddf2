// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ferrobot - Competition robot mode scheduling
//!
//! Drives user robot code through the disabled / autonomous / teleop / test
//! phases of a match in step with the driver station, while a background
//! thread keeps the control-state cache fresh and reports back which mode
//! the program is running.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrobot::{
//!     CompetitionRobot, CompetitionScheduler, DriverStation, Result, SchedulerConfig,
//!     SimDriverStation,
//! };
//! use std::sync::Arc;
//!
//! struct MyRobot;
//!
//! impl CompetitionRobot for MyRobot {
//!     fn on_teleop(&mut self) {
//!         println!("driver has control");
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let source = Arc::new(SimDriverStation::new());
//!     let driver_station = Arc::new(DriverStation::new(source));
//!
//!     let scheduler = CompetitionScheduler::new(driver_station, SchedulerConfig::from_env())?;
//!     scheduler.run(&mut MyRobot)
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         User robot code                             |
//! |   CompetitionRobot::on_disabled / on_autonomous / on_teleop / ...   |
//! +---------------------------------------------------------------------+
//! |                  CompetitionScheduler (main thread)                 |
//! |   classify mode id -> edge-triggered entry -> bounded wait          |
//! +---------------------------------------------------------------------+
//! |                ModeMonitor (background thread)                      |
//! |   wait new data -> DriverStation::refresh_data -> report mode       |
//! +---------------------------------------------------------------------+
//! |                DriverStation snapshot cache                         |
//! |   ControlWord + mode id, refreshed-data events                      |
//! +---------------------------------------------------------------------+
//! |                ControlSource (driver station link / simulator)      |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Threading
//!
//! Exactly one mode monitor thread exists per running scheduler. User
//! callbacks always run on the thread that called
//! [`CompetitionScheduler::run`]; [`CompetitionHandle::end_competition`] may
//! be called from anywhere (signal handlers, watchdogs, other threads).

/// Scheduler configuration (defaults, environment overrides).
pub mod config;
/// Emergency-stop / attachment flags snapshot.
pub mod control_word;
/// Cached control state and refreshed-data notification.
pub mod driver_station;
/// Error types.
pub mod error;
/// Signal events with bounded, interruptible waits.
pub mod event;
/// Background thread that keeps the control-state cache fresh.
pub mod monitor;
/// Named mode options and their stable ids.
pub mod registry;
/// Competition mode dispatch loop.
pub mod scheduler;
/// In-process driver station for tests and desktop runs.
pub mod sim;
/// Control-state source abstraction.
pub mod source;

pub use config::{SchedulerConfig, DISABLED_MODE_ID};
pub use control_word::ControlWord;
pub use driver_station::DriverStation;
pub use error::{Error, Result};
pub use event::{Event, Interrupt, WaitOutcome};
pub use monitor::ModeMonitor;
pub use registry::{ModeOption, ModeRegistry, RegisteredMode};
pub use scheduler::{
    classify, Category, CompetitionHandle, CompetitionRobot, CompetitionScheduler, ModeIds,
    SchedulerState,
};
pub use sim::SimDriverStation;
pub use source::ControlSource;
