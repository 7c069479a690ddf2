// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scheduler configuration: compile-time defaults plus environment overrides.
//!
//! ## Environment variables
//! - `FERROBOT_MONITOR_TIMEOUT_MS`: mode monitor wait bound (default: 100)
//! - `FERROBOT_DATA_WAIT_TIMEOUT_MS`: scheduler wait bound (default: 100)
//! - `FERROBOT_AUTO_MODE`: name registered for autonomous (default: "auto")
//! - `FERROBOT_TELEOP_MODE`: name registered for teleop (default: "teleop")
//! - `FERROBOT_TEST_MODE`: name registered for test (default: "test")
//!
//! Unparsable or empty values are ignored and the default is kept.
//!
//! # Example
//!
//! ```bash
//! export FERROBOT_MONITOR_TIMEOUT_MS=50
//! export FERROBOT_AUTO_MODE="two-piece-auto"
//! ```

use crate::{Error, Result};
use std::env;
use std::time::Duration;

/// Mode id reserved for "disabled". Never handed out by a registry.
pub const DISABLED_MODE_ID: i32 = 0;

/// Default bound on the mode monitor's wait for new control data.
///
/// The monitor refreshes the cache at least this often even when the
/// control authority goes quiet.
pub const DEFAULT_MONITOR_TIMEOUT: Duration = Duration::from_millis(100);

/// Default bound on the scheduler's wait for refreshed data.
///
/// Worst-case latency between `end_competition()` and loop exit.
pub const DEFAULT_DATA_WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Default mode option names.
pub const DEFAULT_AUTONOMOUS_MODE: &str = "auto";
pub const DEFAULT_TELEOP_MODE: &str = "teleop";
pub const DEFAULT_TEST_MODE: &str = "test";

/// Environment variable names
pub const ENV_MONITOR_TIMEOUT_MS: &str = "FERROBOT_MONITOR_TIMEOUT_MS";
pub const ENV_DATA_WAIT_TIMEOUT_MS: &str = "FERROBOT_DATA_WAIT_TIMEOUT_MS";
pub const ENV_AUTONOMOUS_MODE: &str = "FERROBOT_AUTO_MODE";
pub const ENV_TELEOP_MODE: &str = "FERROBOT_TELEOP_MODE";
pub const ENV_TEST_MODE: &str = "FERROBOT_TEST_MODE";

/// Configuration for [`CompetitionScheduler`](crate::CompetitionScheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Wait bound used by the mode monitor thread.
    pub monitor_timeout: Duration,
    /// Wait bound used by the scheduler between mode checks.
    pub data_wait_timeout: Duration,
    /// Name registered for the autonomous mode option.
    pub autonomous_mode: String,
    /// Name registered for the teleop mode option.
    pub teleop_mode: String,
    /// Name registered for the test mode option.
    pub test_mode: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            monitor_timeout: DEFAULT_MONITOR_TIMEOUT,
            data_wait_timeout: DEFAULT_DATA_WAIT_TIMEOUT,
            autonomous_mode: DEFAULT_AUTONOMOUS_MODE.to_string(),
            teleop_mode: DEFAULT_TELEOP_MODE.to_string(),
            test_mode: DEFAULT_TEST_MODE.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(timeout) = env_millis(ENV_MONITOR_TIMEOUT_MS) {
            config.monitor_timeout = timeout;
        }
        if let Some(timeout) = env_millis(ENV_DATA_WAIT_TIMEOUT_MS) {
            config.data_wait_timeout = timeout;
        }
        if let Some(name) = env_name(ENV_AUTONOMOUS_MODE) {
            config.autonomous_mode = name;
        }
        if let Some(name) = env_name(ENV_TELEOP_MODE) {
            config.teleop_mode = name;
        }
        if let Some(name) = env_name(ENV_TEST_MODE) {
            config.test_mode = name;
        }

        config
    }

    #[must_use]
    pub fn with_monitor_timeout(mut self, timeout: Duration) -> Self {
        self.monitor_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_data_wait_timeout(mut self, timeout: Duration) -> Self {
        self.data_wait_timeout = timeout;
        self
    }

    /// Override the three registered mode names at once.
    #[must_use]
    pub fn with_mode_names(
        mut self,
        autonomous: impl Into<String>,
        teleop: impl Into<String>,
        test: impl Into<String>,
    ) -> Self {
        self.autonomous_mode = autonomous.into();
        self.teleop_mode = teleop.into();
        self.test_mode = test.into();
        self
    }

    /// Reject zero wait bounds and empty or colliding mode names.
    pub fn validate(&self) -> Result<()> {
        if self.monitor_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "monitor_timeout must be non-zero".to_string(),
            ));
        }
        if self.data_wait_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "data_wait_timeout must be non-zero".to_string(),
            ));
        }

        let names = [
            ("autonomous_mode", &self.autonomous_mode),
            ("teleop_mode", &self.teleop_mode),
            ("test_mode", &self.test_mode),
        ];
        for (field, name) in names {
            if name.is_empty() {
                return Err(Error::InvalidConfig(format!("{} must not be empty", field)));
            }
        }
        if self.autonomous_mode == self.teleop_mode
            || self.autonomous_mode == self.test_mode
            || self.teleop_mode == self.test_mode
        {
            return Err(Error::InvalidConfig(
                "mode names must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_millis(var: &str) -> Option<Duration> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            log::warn!("[CONFIG] Ignoring {}={:?}: not a millisecond count", var, raw);
            None
        }
    }
}

fn env_name(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.monitor_timeout, Duration::from_millis(100));
        assert_eq!(config.data_wait_timeout, Duration::from_millis(100));
        assert_eq!(config.autonomous_mode, "auto");
        assert_eq!(config.teleop_mode, "teleop");
        assert_eq!(config.test_mode, "test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SchedulerConfig::default()
            .with_monitor_timeout(Duration::from_millis(20))
            .with_data_wait_timeout(Duration::from_millis(30))
            .with_mode_names("a", "b", "c");

        assert_eq!(config.monitor_timeout, Duration::from_millis(20));
        assert_eq!(config.data_wait_timeout, Duration::from_millis(30));
        assert_eq!(config.autonomous_mode, "a");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let config = SchedulerConfig::default().with_monitor_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = SchedulerConfig::default().with_data_wait_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let config = SchedulerConfig::default().with_mode_names("", "teleop", "test");
        assert!(config.validate().is_err());

        let config = SchedulerConfig::default().with_mode_names("auto", "auto", "test");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_overrides_and_ignores_garbage() {
        // Single test touches the environment to avoid races between tests.
        env::set_var(ENV_MONITOR_TIMEOUT_MS, "25");
        env::set_var(ENV_DATA_WAIT_TIMEOUT_MS, "not-a-number");
        env::set_var(ENV_AUTONOMOUS_MODE, "  two-piece  ");
        env::set_var(ENV_TELEOP_MODE, "");

        let config = SchedulerConfig::from_env();

        env::remove_var(ENV_MONITOR_TIMEOUT_MS);
        env::remove_var(ENV_DATA_WAIT_TIMEOUT_MS);
        env::remove_var(ENV_AUTONOMOUS_MODE);
        env::remove_var(ENV_TELEOP_MODE);

        assert_eq!(config.monitor_timeout, Duration::from_millis(25));
        assert_eq!(config.data_wait_timeout, DEFAULT_DATA_WAIT_TIMEOUT);
        assert_eq!(config.autonomous_mode, "two-piece");
        assert_eq!(config.teleop_mode, DEFAULT_TELEOP_MODE);
    }
}
