// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cached view of the control source.
//!
//! The mode monitor thread is the single writer: each [`DriverStation::refresh_data`]
//! reads the source and publishes a fresh snapshot with one atomic pointer
//! swap (`ArcSwap`), so readers on any thread always see a complete control
//! word and mode id pair. After a successful refresh every registered
//! "refreshed data" event is signaled; this is what the scheduler blocks on.

use crate::config::DISABLED_MODE_ID;
use crate::control_word::ControlWord;
use crate::event::Event;
use crate::registry::ModeOption;
use crate::source::ControlSource;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Snapshot {
    control_word: ControlWord,
    mode_id: i32,
}

/// Snapshot cache over a [`ControlSource`].
pub struct DriverStation {
    source: Arc<dyn ControlSource>,
    snapshot: ArcSwap<Snapshot>,
    refreshed_events: Mutex<Vec<Event>>,
    mode_names: DashMap<String, i32>,
    refresh_count: AtomicU64,
}

impl DriverStation {
    /// Wrap `source`. The cache starts disabled with a cleared control word
    /// until the first refresh.
    #[must_use]
    pub fn new(source: Arc<dyn ControlSource>) -> Self {
        Self {
            source,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            refreshed_events: Mutex::new(Vec::new()),
            mode_names: DashMap::new(),
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Pull fresh state from the source.
    ///
    /// Returns `false` when the source could not be read; the previous
    /// snapshot stays in place and no refreshed-data event fires.
    pub fn refresh_data(&self) -> bool {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);

        let Some(control_word) = self.source.read_control_word() else {
            log::debug!("[DRIVER-STATION] source unreachable, keeping previous snapshot");
            return false;
        };
        let mode_id = self.source.current_mode_id();
        self.snapshot.store(Arc::new(Snapshot {
            control_word,
            mode_id,
        }));

        let events = self.refreshed_events.lock();
        for event in events.iter() {
            if let Err(e) = event.set() {
                log::warn!("[DRIVER-STATION] refreshed-data event used after release: {}", e);
            }
        }
        true
    }

    /// Number of refresh attempts so far (successful or not).
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    /// Last completed control word snapshot.
    #[must_use]
    pub fn control_word(&self) -> ControlWord {
        self.snapshot.load().control_word
    }

    /// Copy the last completed control word into `word`.
    pub fn refresh_control_word(&self, word: &mut ControlWord) {
        word.update(&self.snapshot.load().control_word);
    }

    /// Cached mode id (0 = disabled).
    #[must_use]
    pub fn mode_id(&self) -> i32 {
        self.snapshot.load().mode_id
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.mode_id() == DISABLED_MODE_ID
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.is_disabled()
    }

    #[must_use]
    pub fn is_mode(&self, mode_id: i32) -> bool {
        self.mode_id() == mode_id
    }

    /// Whether the active mode is the one registered here under `name`.
    #[must_use]
    pub fn is_mode_named(&self, name: &str) -> bool {
        self.mode_names
            .get(name)
            .is_some_and(|id| *id == self.mode_id())
    }

    /// Register a mode option with the source and remember its name locally.
    pub fn add_mode_option(
        &self,
        name: &str,
        category: &str,
        description: &str,
        flags: i32,
    ) -> i32 {
        let option = ModeOption::new(name)
            .with_category(category)
            .with_description(description)
            .with_flags(flags);
        let id = self.source.add_mode_option(option);
        if id > DISABLED_MODE_ID {
            self.mode_names.insert(name.to_string(), id);
        }
        id
    }

    /// Signal `event` after every successful refresh.
    pub fn provide_refreshed_data_event(&self, event: &Event) {
        let mut events = self.refreshed_events.lock();
        if !events.contains(event) {
            events.push(event.clone());
        }
    }

    pub fn remove_refreshed_data_event(&self, event: &Event) {
        self.refreshed_events.lock().retain(|e| e != event);
    }

    #[must_use]
    pub fn refreshed_data_event_count(&self) -> usize {
        self.refreshed_events.lock().len()
    }

    /// Handles currently signaled after each refresh, in registration order.
    #[must_use]
    pub fn refreshed_data_events(&self) -> Vec<Event> {
        self.refreshed_events.lock().clone()
    }

    pub fn provide_new_data_event(&self, event: &Event) {
        self.source.provide_new_data_event(event);
    }

    pub fn remove_new_data_event(&self, event: &Event) {
        self.source.remove_new_data_event(event);
    }

    pub fn observe_user_program_starting(&self) {
        self.source.observe_user_program_starting();
    }

    pub fn observe_user_program_mode(&self, mode_id: i32) {
        self.source.observe_user_program_mode(mode_id);
    }
}

impl std::fmt::Debug for DriverStation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverStation")
            .field("snapshot", &**self.snapshot.load())
            .field("refresh_count", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
