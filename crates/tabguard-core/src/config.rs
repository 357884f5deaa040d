//! Configuration for the navigation guard.
//!
//! Handles loading and validation of guard tuning from TOML. Every
//! constant the loop detector relies on is a tunable here, not a literal
//! in the state machines.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning for loop detection, throttling, and cooldown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Sliding loop-detection window in milliseconds
    #[serde(default = "default_loop_window_ms")]
    pub loop_window_ms: u64,

    /// Attempts inside the window that confirm a navigation loop
    #[serde(default = "default_max_attempts_in_window")]
    pub max_attempts_in_window: u32,

    /// Base delay for the exponential switch throttle in milliseconds
    #[serde(default = "default_base_throttle_ms")]
    pub base_throttle_ms: u64,

    /// Full-stop cooldown once the breaker trips, in milliseconds.
    /// Also caps the exponential throttle delay.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Pause before a deferred follow-up navigation is replayed
    #[serde(default = "default_pending_debounce_ms")]
    pub pending_debounce_ms: u64,

    /// Query parameter that marks a recovery navigation
    #[serde(default = "default_recovery_param")]
    pub recovery_param: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            loop_window_ms: default_loop_window_ms(),
            max_attempts_in_window: default_max_attempts_in_window(),
            base_throttle_ms: default_base_throttle_ms(),
            cooldown_ms: default_cooldown_ms(),
            pending_debounce_ms: default_pending_debounce_ms(),
            recovery_param: default_recovery_param(),
        }
    }
}

fn default_loop_window_ms() -> u64 {
    2_000
}

fn default_max_attempts_in_window() -> u32 {
    2
}

fn default_base_throttle_ms() -> u64 {
    500
}

fn default_cooldown_ms() -> u64 {
    30_000
}

fn default_pending_debounce_ms() -> u64 {
    100
}

fn default_recovery_param() -> String {
    "recovery".to_string()
}

impl GuardConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the state machines rely on.
    pub fn validate(&self) -> Result<()> {
        if self.loop_window_ms == 0 {
            return Err(Error::Config("loop_window_ms must be positive".to_string()));
        }
        if self.max_attempts_in_window == 0 {
            return Err(Error::Config(
                "max_attempts_in_window must be at least 1".to_string(),
            ));
        }
        if self.cooldown_ms == 0 {
            return Err(Error::Config("cooldown_ms must be positive".to_string()));
        }
        Ok(())
    }
}
