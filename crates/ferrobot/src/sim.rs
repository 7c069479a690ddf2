// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Simulated driver station.
//!
//! Holds the state a real driver station link would deliver and lets tests
//! (or the `ferrobot-sim` tool) script it. Setters only change state; call
//! [`SimDriverStation::notify_new_data`] to signal registered events the way
//! an arriving packet would.
//!
//! # Example
//! ```ignore
//! let sim = Arc::new(SimDriverStation::new());
//! let ds = Arc::new(DriverStation::new(sim.clone()));
//!
//! sim.set_operator_attached(true);
//! sim.set_mode("auto");
//! sim.notify_new_data();
//! ```

use crate::config::DISABLED_MODE_ID;
use crate::control_word::ControlWord;
use crate::event::Event;
use crate::registry::{ModeOption, ModeRegistry};
use crate::source::ControlSource;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};

#[derive(Debug, Default)]
struct SimState {
    control_word: ControlWord,
    reachable: bool,
    mode_id: i32,
    selected_autonomous: i32,
    selected_teleop: i32,
}

/// In-process [`ControlSource`] with scriptable state.
#[derive(Debug)]
pub struct SimDriverStation {
    state: Mutex<SimState>,
    modes: ModeRegistry,
    new_data_events: Mutex<Vec<Event>>,
    program_started: AtomicBool,
    last_reported_mode: AtomicI32,
    reported_mode_count: AtomicU64,
}

impl SimDriverStation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                reachable: true,
                ..SimState::default()
            }),
            modes: ModeRegistry::new(),
            new_data_events: Mutex::new(Vec::new()),
            program_started: AtomicBool::new(false),
            last_reported_mode: AtomicI32::new(DISABLED_MODE_ID),
            reported_mode_count: AtomicU64::new(0),
        }
    }

    /// Mode options registered so far.
    #[must_use]
    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    pub fn set_control_word(&self, word: ControlWord) {
        self.state.lock().control_word = word;
    }

    pub fn set_emergency_stop(&self, value: bool) {
        let mut state = self.state.lock();
        let word = state.control_word;
        state.control_word = ControlWord::new(
            value,
            word.is_control_authority_attached(),
            word.is_operator_attached(),
        );
    }

    pub fn set_control_authority_attached(&self, value: bool) {
        let mut state = self.state.lock();
        let word = state.control_word;
        state.control_word =
            ControlWord::new(word.is_emergency_stopped(), value, word.is_operator_attached());
    }

    pub fn set_operator_attached(&self, value: bool) {
        let mut state = self.state.lock();
        let word = state.control_word;
        state.control_word = ControlWord::new(
            word.is_emergency_stopped(),
            word.is_control_authority_attached(),
            value,
        );
    }

    /// Make `read_control_word` fail (`false`) or succeed again (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Set the active mode by raw id. Ids need not be registered.
    pub fn set_mode_id(&self, mode_id: i32) {
        self.state.lock().mode_id = mode_id;
    }

    /// Set the active mode by name and return the id it resolved to.
    ///
    /// Unknown names resolve to 0, which disables the robot.
    pub fn set_mode(&self, name: &str) -> i32 {
        let mode_id = self.resolve(name);
        self.set_mode_id(mode_id);
        mode_id
    }

    /// Disable the robot (mode id 0).
    pub fn disable(&self) {
        self.set_mode_id(DISABLED_MODE_ID);
    }

    #[must_use]
    pub fn mode_id(&self) -> i32 {
        self.state.lock().mode_id
    }

    /// Select the mode to run during the autonomous period. Returns its id.
    pub fn set_selected_autonomous_mode(&self, name: &str) -> i32 {
        let mode_id = self.resolve(name);
        self.state.lock().selected_autonomous = mode_id;
        mode_id
    }

    #[must_use]
    pub fn selected_autonomous_mode_id(&self) -> i32 {
        self.state.lock().selected_autonomous
    }

    /// Select the mode to run during the teleoperated period. Returns its id.
    pub fn set_selected_teleop_mode(&self, name: &str) -> i32 {
        let mode_id = self.resolve(name);
        self.state.lock().selected_teleop = mode_id;
        mode_id
    }

    #[must_use]
    pub fn selected_teleop_mode_id(&self) -> i32 {
        self.state.lock().selected_teleop
    }

    /// Signal every registered new-data event, as an arriving packet would.
    pub fn notify_new_data(&self) {
        let events = self.new_data_events.lock();
        for event in events.iter() {
            if let Err(e) = event.set() {
                log::warn!("[SIM-DS] new-data event still registered after release: {}", e);
            }
        }
    }

    #[must_use]
    pub fn new_data_event_count(&self) -> usize {
        self.new_data_events.lock().len()
    }

    /// Whether user code announced it finished starting.
    #[must_use]
    pub fn user_program_started(&self) -> bool {
        self.program_started.load(Ordering::Acquire)
    }

    /// Most recent mode user code reported, if it reported any.
    #[must_use]
    pub fn last_reported_mode(&self) -> Option<i32> {
        if self.reported_mode_count.load(Ordering::Acquire) == 0 {
            None
        } else {
            Some(self.last_reported_mode.load(Ordering::Acquire))
        }
    }

    #[must_use]
    pub fn reported_mode_count(&self) -> u64 {
        self.reported_mode_count.load(Ordering::Acquire)
    }

    /// Return to power-on state: disabled, flags clear, no modes, no reports.
    ///
    /// Registered new-data events are kept so a running monitor keeps working.
    pub fn reset(&self) {
        *self.state.lock() = SimState {
            reachable: true,
            ..SimState::default()
        };
        self.modes.clear();
        self.program_started.store(false, Ordering::Release);
        self.last_reported_mode
            .store(DISABLED_MODE_ID, Ordering::Release);
        self.reported_mode_count.store(0, Ordering::Release);
    }

    fn resolve(&self, name: &str) -> i32 {
        self.modes.id_of(name).unwrap_or_else(|| {
            log::debug!("[SIM-DS] unknown mode {:?}, using disabled", name);
            DISABLED_MODE_ID
        })
    }
}

impl Default for SimDriverStation {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSource for SimDriverStation {
    fn read_control_word(&self) -> Option<ControlWord> {
        let state = self.state.lock();
        state.reachable.then_some(state.control_word)
    }

    fn current_mode_id(&self) -> i32 {
        self.state.lock().mode_id
    }

    fn add_mode_option(&self, option: ModeOption) -> i32 {
        self.modes.add(option)
    }

    fn provide_new_data_event(&self, event: &Event) {
        let mut events = self.new_data_events.lock();
        if !events.contains(event) {
            events.push(event.clone());
        }
    }

    fn remove_new_data_event(&self, event: &Event) {
        self.new_data_events.lock().retain(|e| e != event);
    }

    fn observe_user_program_starting(&self) {
        self.program_started.store(true, Ordering::Release);
    }

    fn observe_user_program_mode(&self, mode_id: i32) {
        self.last_reported_mode.store(mode_id, Ordering::Release);
        self.reported_mode_count.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Interrupt, WaitOutcome};
    use std::time::Duration;

    #[test]
    fn test_set_mode_by_name() {
        let sim = SimDriverStation::new();
        let auto = sim.add_mode_option(ModeOption::new("auto"));

        assert_eq!(sim.set_mode("auto"), auto);
        assert_eq!(sim.current_mode_id(), auto);

        assert_eq!(sim.set_mode("nope"), DISABLED_MODE_ID);
        assert_eq!(sim.current_mode_id(), DISABLED_MODE_ID);
    }

    #[test]
    fn test_control_word_setters_compose() {
        let sim = SimDriverStation::new();
        sim.set_operator_attached(true);
        sim.set_control_authority_attached(true);
        sim.set_emergency_stop(true);

        let word = sim.read_control_word().expect("reachable");
        assert_eq!(word, ControlWord::new(true, true, true));

        sim.set_emergency_stop(false);
        let word = sim.read_control_word().expect("reachable");
        assert_eq!(word, ControlWord::new(false, true, true));
    }

    #[test]
    fn test_unreachable_source_reads_none() {
        let sim = SimDriverStation::new();
        sim.set_reachable(false);
        assert!(sim.read_control_word().is_none());
        sim.set_reachable(true);
        assert!(sim.read_control_word().is_some());
    }

    #[test]
    fn test_notify_signals_registered_events_only() {
        let sim = SimDriverStation::new();
        let registered = Event::new(false, false);
        let removed = Event::new(false, false);

        sim.provide_new_data_event(&registered);
        sim.provide_new_data_event(&registered);
        sim.provide_new_data_event(&removed);
        assert_eq!(sim.new_data_event_count(), 2);

        sim.remove_new_data_event(&removed);
        sim.notify_new_data();

        let interrupt = Interrupt::new();
        assert_eq!(
            registered.wait_timeout(Duration::from_millis(10), &interrupt),
            WaitOutcome::Signaled
        );
        assert!(!removed.is_set());
    }

    #[test]
    fn test_selected_modes() {
        let sim = SimDriverStation::new();
        let auto = sim.add_mode_option(ModeOption::new("auto"));
        let teleop = sim.add_mode_option(ModeOption::new("teleop"));

        assert_eq!(sim.set_selected_autonomous_mode("auto"), auto);
        assert_eq!(sim.set_selected_teleop_mode("teleop"), teleop);
        assert_eq!(sim.selected_autonomous_mode_id(), auto);
        assert_eq!(sim.selected_teleop_mode_id(), teleop);
        // Selection does not change the active mode.
        assert_eq!(sim.current_mode_id(), DISABLED_MODE_ID);
    }

    #[test]
    fn test_observations_and_reset() {
        let sim = SimDriverStation::new();
        assert_eq!(sim.last_reported_mode(), None);

        sim.observe_user_program_starting();
        sim.observe_user_program_mode(3);
        sim.observe_user_program_mode(4);

        assert!(sim.user_program_started());
        assert_eq!(sim.last_reported_mode(), Some(4));
        assert_eq!(sim.reported_mode_count(), 2);

        sim.add_mode_option(ModeOption::new("auto"));
        sim.set_mode_id(7);
        sim.reset();

        assert!(!sim.user_program_started());
        assert_eq!(sim.last_reported_mode(), None);
        assert_eq!(sim.current_mode_id(), DISABLED_MODE_ID);
        assert!(sim.modes().is_empty());
    }
}
