// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Driver station control word snapshot.

use crate::driver_station::DriverStation;

/// Snapshot of the three control-authority flags.
///
/// The word is `Copy` and only ever replaced whole, so a reader holding a
/// `ControlWord` can never observe a half-applied refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlWord {
    emergency_stop: bool,
    control_authority_attached: bool,
    operator_attached: bool,
}

impl ControlWord {
    #[must_use]
    pub const fn new(
        emergency_stop: bool,
        control_authority_attached: bool,
        operator_attached: bool,
    ) -> Self {
        Self {
            emergency_stop,
            control_authority_attached,
            operator_attached,
        }
    }

    /// Replace this word with `other`.
    pub fn update(&mut self, other: &ControlWord) {
        *self = *other;
    }

    /// Replace this word with the driver station's last completed snapshot.
    ///
    /// Never fails. If the control source has gone quiet the cached snapshot
    /// is the previous one, so stale flags are kept rather than cleared.
    pub fn refresh(&mut self, driver_station: &DriverStation) {
        driver_station.refresh_control_word(self);
    }

    /// Whether the robot is emergency-stopped.
    #[must_use]
    pub const fn is_emergency_stopped(&self) -> bool {
        self.emergency_stop
    }

    /// Whether a field management system (control authority) is attached.
    #[must_use]
    pub const fn is_control_authority_attached(&self) -> bool {
        self.control_authority_attached
    }

    /// Whether an operator console (driver station) is attached.
    #[must_use]
    pub const fn is_operator_attached(&self) -> bool {
        self.operator_attached
    }
}
