// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mode option registry: stable integer ids for named operating modes.
//!
//! Ids start at 1 and are never reused within a registry; 0 is reserved for
//! "disabled" and is what an empty name or an unknown removal returns.

use crate::config::DISABLED_MODE_ID;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI32, Ordering};

/// A named operating mode as offered to the driver station.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeOption {
    /// Unique name (registry key).
    pub name: String,
    /// Display category.
    pub category: String,
    /// Extended description.
    pub description: String,
    /// Opaque flags forwarded to the driver station.
    pub flags: i32,
}

impl ModeOption {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }
}

/// A mode option together with the id it was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredMode {
    pub id: i32,
    pub option: ModeOption,
}

/// Thread-safe name -> id registry.
#[derive(Debug)]
pub struct ModeRegistry {
    modes: DashMap<String, RegisteredMode>,
    next_id: AtomicI32,
}

impl ModeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            modes: DashMap::new(),
            next_id: AtomicI32::new(DISABLED_MODE_ID + 1),
        }
    }

    /// Register `option` and return its id.
    ///
    /// An empty name registers nothing and returns 0. Re-adding a known name
    /// replaces its category, description and flags but keeps its id.
    pub fn add(&self, option: ModeOption) -> i32 {
        if option.name.is_empty() {
            return DISABLED_MODE_ID;
        }

        match self.modes.entry(option.name.clone()) {
            Entry::Occupied(mut entry) => {
                let id = entry.get().id;
                entry.get_mut().option = option;
                id
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                log::debug!("[MODE-REGISTRY] registered {:?} as id {}", option.name, id);
                entry.insert(RegisteredMode { id, option });
                id
            }
        }
    }

    /// Remove a mode by name, returning its id (0 if it was not registered).
    pub fn remove(&self, name: &str) -> i32 {
        self.modes
            .remove(name)
            .map_or(DISABLED_MODE_ID, |(_, mode)| mode.id)
    }

    /// Drop every registered mode. Ids handed out so far are not reused.
    pub fn clear(&self) {
        self.modes.clear();
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.modes.get(name).map(|mode| mode.id)
    }

    #[must_use]
    pub fn name_of(&self, id: i32) -> Option<String> {
        self.modes
            .iter()
            .find(|mode| mode.id == id)
            .map(|mode| mode.option.name.clone())
    }

    /// All registered modes, ordered by id.
    #[must_use]
    pub fn options(&self) -> Vec<RegisteredMode> {
        let mut modes: Vec<RegisteredMode> =
            self.modes.iter().map(|mode| mode.value().clone()).collect();
        modes.sort_by_key(|mode| mode.id);
        modes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
