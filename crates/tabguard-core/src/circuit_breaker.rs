//! Hard navigation stop once a loop is confirmed.
//!
//! Supersedes the throttle tracker after a loop verdict: all navigation
//! is rejected for a fixed cooldown, then the breaker deactivates lazily
//! on the next query. No background timer exists, so a manual reset never
//! races a pending expiry callback.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Idle,
    Active { activated_at_ms: u64 },
}

/// Public-facing breaker state for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerStateKind {
    Idle,
    Active,
}

/// Snapshot of breaker status for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerStatus {
    pub state: BreakerStateKind,
    pub cooldown_ms: u64,
    pub active_for_ms: Option<u64>,
    pub cooldown_remaining_ms: Option<u64>,
}

/// Two-state cooldown latch driven by loop detection.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    cooldown_ms: u64,
    state: BreakerState,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>, cooldown_ms: u64) -> Self {
        Self {
            name: name.into(),
            cooldown_ms,
            state: BreakerState::Idle,
        }
    }

    /// Activate the breaker at `now_ms`. Idempotent while already active;
    /// a stored cooldown that has already lapsed is replaced by a fresh one.
    pub fn trip(&mut self, now_ms: u64) {
        let expired = match self.state {
            BreakerState::Idle => true,
            BreakerState::Active { activated_at_ms } => {
                now_ms.saturating_sub(activated_at_ms) >= self.cooldown_ms
            }
        };
        if expired {
            self.state = BreakerState::Active {
                activated_at_ms: now_ms,
            };
            warn!(
                breaker = %self.name,
                cooldown_ms = self.cooldown_ms,
                "navigation circuit breaker activated"
            );
        }
    }

    /// Whether navigation is currently suspended.
    ///
    /// Expiry is evaluated lazily: the first query at or past the
    /// cooldown boundary flips the state back to idle, exactly once.
    pub fn is_active(&mut self, now_ms: u64) -> bool {
        match self.state {
            BreakerState::Idle => false,
            BreakerState::Active { activated_at_ms } => {
                if now_ms.saturating_sub(activated_at_ms) >= self.cooldown_ms {
                    self.state = BreakerState::Idle;
                    info!(breaker = %self.name, "cooldown elapsed, navigation resumed");
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Time left in the cooldown; `None` when idle or already elapsed.
    #[must_use]
    pub fn cooldown_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        match self.state {
            BreakerState::Idle => None,
            BreakerState::Active { activated_at_ms } => {
                let elapsed = now_ms.saturating_sub(activated_at_ms);
                (elapsed < self.cooldown_ms).then(|| self.cooldown_ms - elapsed)
            }
        }
    }

    /// Unconditional return to idle.
    pub fn reset(&mut self) {
        self.state = BreakerState::Idle;
    }

    /// Status snapshot for reporting.
    ///
    /// Read-only: reports an elapsed cooldown as idle without mutating,
    /// so the view stays consistent with what [`Self::is_active`] would
    /// decide at the same reading.
    #[must_use]
    pub fn status(&self, now_ms: u64) -> BreakerStatus {
        match self.state {
            BreakerState::Idle => BreakerStatus {
                state: BreakerStateKind::Idle,
                cooldown_ms: self.cooldown_ms,
                active_for_ms: None,
                cooldown_remaining_ms: None,
            },
            BreakerState::Active { activated_at_ms } => {
                let elapsed = now_ms.saturating_sub(activated_at_ms);
                if elapsed >= self.cooldown_ms {
                    BreakerStatus {
                        state: BreakerStateKind::Idle,
                        cooldown_ms: self.cooldown_ms,
                        active_for_ms: None,
                        cooldown_remaining_ms: None,
                    }
                } else {
                    BreakerStatus {
                        state: BreakerStateKind::Active,
                        cooldown_ms: self.cooldown_ms,
                        active_for_ms: Some(elapsed),
                        cooldown_remaining_ms: Some(self.cooldown_ms - elapsed),
                    }
                }
            }
        }
    }
}
