// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by scheduler setup and lifecycle operations.
//!
//! Expected runtime conditions (wait timeouts, cooperative cancellation,
//! unknown mode ids, an unreachable control source) are absorbed inside the
//! scheduler and never show up here.

use thiserror::Error;

/// Scheduler errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The mode monitor thread could not be spawned.
    #[error("Failed to spawn mode monitor thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// The control source refused a mode option (returned a non-positive id).
    #[error("Mode registration failed for {name:?} (got id {id})")]
    ModeRegistration { name: String, id: i32 },

    /// `run()` was called on a scheduler that already started once.
    #[error("Competition scheduler already started")]
    AlreadyStarted,

    /// Scheduler configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation attempted on an event handle that was already released.
    #[error("Event handle {0} already destroyed")]
    EventDestroyed(u64),
}

/// Result alias for ferrobot operations.
pub type Result<T> = std::result::Result<T, Error>;
