// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The authoritative control-state source.
//!
//! On a real robot this is the driver station link in the hardware layer; in
//! tests and on a desktop it is [`SimDriverStation`](crate::SimDriverStation).
//! The scheduler core only ever talks to the source through this trait.

use crate::control_word::ControlWord;
use crate::event::Event;
use crate::registry::ModeOption;

/// Control-state provider consumed by the scheduler and mode monitor.
pub trait ControlSource: Send + Sync {
    /// Read the current control word.
    ///
    /// Returns `None` when the source cannot be queried right now; callers
    /// keep their previous snapshot in that case.
    fn read_control_word(&self) -> Option<ControlWord>;

    /// Active mode id: 0 when disabled, otherwise an id from `add_mode_option`.
    fn current_mode_id(&self) -> i32;

    /// Offer a named mode to the driver station and return its stable id.
    fn add_mode_option(&self, option: ModeOption) -> i32;

    /// Signal `event` whenever new control data arrives.
    fn provide_new_data_event(&self, event: &Event);

    /// Stop signaling `event`.
    fn remove_new_data_event(&self, event: &Event);

    /// One-time announcement that user code finished starting.
    fn observe_user_program_starting(&self);

    /// Diagnostic report of which mode user code claims to be running.
    fn observe_user_program_mode(&self, mode_id: i32);
}
