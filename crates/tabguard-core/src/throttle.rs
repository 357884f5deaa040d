//! Sliding-window attempt tracking with exponential switch throttling.
//!
//! First line of defense against navigation loops: every tab-switch
//! request is recorded here, attempts are counted inside a short
//! detection window, and the permitted request rate decays exponentially
//! as the window fills. A request that finds the window already at the
//! attempt threshold is reported as a loop so the circuit breaker can
//! take over.
//!
//! The detection window is short and the threshold aggressive on purpose:
//! this is a brake against bugs elsewhere in the caller's effect chain,
//! not an analytics tool. An occasional unnecessary pause costs far less
//! than a missed loop pegging the UI thread.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::GuardConfig;

/// Verdict for a recorded tab-switch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopVerdict {
    /// The attempt is within bounds
    Allowed,
    /// The window already held the attempt threshold; navigation must be broken
    LoopDetected,
}

/// Snapshot of throttle state for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleStatus {
    /// Attempts currently inside the detection window
    pub recent_attempt_count: u32,
    /// Clock reading of the most recent recorded attempt
    pub last_attempt_ms: Option<u64>,
    /// Delay the next attempt would have to clear
    pub next_delay_ms: u64,
    /// Detection window width
    pub loop_window_ms: u64,
    /// Attempt threshold that confirms a loop
    pub max_attempts_in_window: u32,
}

/// Records attempt timestamps and decides when switching is too rapid.
#[derive(Debug)]
pub struct ThrottleTracker {
    attempts: VecDeque<u64>,
    last_attempt_ms: Option<u64>,
    loop_window_ms: u64,
    max_attempts_in_window: u32,
    base_throttle_ms: u64,
    max_throttle_ms: u64,
}

impl ThrottleTracker {
    #[must_use]
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            attempts: VecDeque::new(),
            last_attempt_ms: None,
            loop_window_ms: config.loop_window_ms,
            max_attempts_in_window: config.max_attempts_in_window.max(1),
            base_throttle_ms: config.base_throttle_ms,
            // The throttle delay is capped at the breaker cooldown so the
            // exponential formula cannot outgrow the hard stop it precedes.
            max_throttle_ms: config.cooldown_ms,
        }
    }

    fn prune(&mut self, now_ms: u64) {
        while let Some(&front) = self.attempts.front() {
            if now_ms.saturating_sub(front) > self.loop_window_ms {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a tab-switch attempt at `now_ms`.
    ///
    /// Returns [`LoopVerdict::LoopDetected`] when the pruned window
    /// already holds `max_attempts_in_window` attempts as this one
    /// arrives; otherwise the attempt is appended and allowed.
    pub fn record_attempt(&mut self, now_ms: u64) -> LoopVerdict {
        self.prune(now_ms);
        if self.attempts.len() >= self.max_attempts_in_window as usize {
            return LoopVerdict::LoopDetected;
        }
        self.attempts.push_back(now_ms);
        self.last_attempt_ms = Some(now_ms);
        LoopVerdict::Allowed
    }

    /// Whether the most recent attempt arrived inside the throttle delay.
    ///
    /// The delay grows exponentially with the number of attempts already
    /// in the window: `base * 2^attempts`, capped at the breaker cooldown.
    pub fn should_throttle(&mut self, now_ms: u64) -> bool {
        self.throttle_remaining_ms(now_ms) > 0
    }

    /// Remaining wait before the throttle clears; 0 when not throttled.
    pub fn throttle_remaining_ms(&mut self, now_ms: u64) -> u64 {
        self.prune(now_ms);
        let len = self.attempts.len();
        if len < 2 {
            return 0;
        }
        let previous = self.attempts[len - 2];
        let gap = now_ms.saturating_sub(previous);
        self.delay_for_attempts(len - 1).saturating_sub(gap)
    }

    /// Attempts currently inside the detection window.
    pub fn recent_attempt_count(&mut self, now_ms: u64) -> u32 {
        self.prune(now_ms);
        self.attempts.len() as u32
    }

    /// Clear the attempt history and delay state.
    pub fn reset(&mut self) {
        self.attempts.clear();
        self.last_attempt_ms = None;
    }

    /// Status snapshot for diagnostics overlays.
    pub fn status(&mut self, now_ms: u64) -> ThrottleStatus {
        self.prune(now_ms);
        ThrottleStatus {
            recent_attempt_count: self.attempts.len() as u32,
            last_attempt_ms: self.last_attempt_ms,
            next_delay_ms: self.delay_for_attempts(self.attempts.len()),
            loop_window_ms: self.loop_window_ms,
            max_attempts_in_window: self.max_attempts_in_window,
        }
    }

    fn delay_for_attempts(&self, attempts: usize) -> u64 {
        // Cap the exponent so the shift cannot overflow; the delay is
        // clamped to the cooldown long before 2^31 anyway.
        let exp = attempts.min(31) as u32;
        self.base_throttle_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_throttle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ThrottleTracker {
        ThrottleTracker::new(&GuardConfig::default())
    }

    #[test]
    fn first_attempt_is_allowed_and_unthrottled() {
        let mut t = tracker();
        assert_eq!(t.record_attempt(1_000), LoopVerdict::Allowed);
        assert!(!t.should_throttle(1_000));
        assert_eq!(t.recent_attempt_count(1_000), 1);
    }

    #[test]
    fn rapid_second_attempt_is_throttled_but_counted() {
        let mut t = tracker();
        t.record_attempt(0);
        assert_eq!(t.record_attempt(200), LoopVerdict::Allowed);
        // One prior attempt in the window: delay = 500 * 2^1 = 1000ms,
        // gap is 200ms.
        assert!(t.should_throttle(200));
        assert_eq!(t.throttle_remaining_ms(200), 800);
        assert_eq!(t.recent_attempt_count(200), 2);
    }

    #[test]
    fn slow_second_attempt_is_not_throttled() {
        let mut t = tracker();
        t.record_attempt(0);
        t.record_attempt(1_500);
        assert!(!t.should_throttle(1_500));
    }

    #[test]
    fn threshold_attempt_reports_loop() {
        let mut t = tracker();
        t.record_attempt(0);
        t.record_attempt(200);
        // Two attempts already in the 2000ms window.
        assert_eq!(t.record_attempt(400), LoopVerdict::LoopDetected);
    }

    #[test]
    fn attempts_outside_window_are_forgotten() {
        let mut t = tracker();
        t.record_attempt(0);
        t.record_attempt(500);
        // Both fall out of the window by t=3000.
        assert_eq!(t.recent_attempt_count(3_000), 0);
        assert_eq!(t.record_attempt(3_000), LoopVerdict::Allowed);
        assert!(!t.should_throttle(3_000));
    }

    #[test]
    fn loop_verdict_does_not_append() {
        let mut t = tracker();
        t.record_attempt(0);
        t.record_attempt(100);
        assert_eq!(t.record_attempt(200), LoopVerdict::LoopDetected);
        assert_eq!(t.recent_attempt_count(200), 2);
    }

    #[test]
    fn reset_clears_history() {
        let mut t = tracker();
        t.record_attempt(0);
        t.record_attempt(100);
        t.reset();
        assert_eq!(t.recent_attempt_count(100), 0);
        assert_eq!(t.record_attempt(150), LoopVerdict::Allowed);
    }

    #[test]
    fn delay_is_capped_at_cooldown() {
        let config = GuardConfig {
            base_throttle_ms: 10_000,
            cooldown_ms: 15_000,
            max_attempts_in_window: 10,
            ..GuardConfig::default()
        };
        let mut t = ThrottleTracker::new(&config);
        for i in 0..5 {
            t.record_attempt(i * 10);
        }
        // 4 prior attempts would give 10s * 2^4 = 160s uncapped.
        assert!(t.throttle_remaining_ms(50) <= 15_000);
        assert_eq!(t.status(50).next_delay_ms, 15_000);
    }

    #[test]
    fn zero_base_never_throttles() {
        let config = GuardConfig {
            base_throttle_ms: 0,
            max_attempts_in_window: 10,
            ..GuardConfig::default()
        };
        let mut t = ThrottleTracker::new(&config);
        t.record_attempt(0);
        t.record_attempt(1);
        t.record_attempt(2);
        assert!(!t.should_throttle(2));
    }

    #[test]
    fn status_reflects_window_contents() {
        let mut t = tracker();
        t.record_attempt(0);
        let status = t.status(100);
        assert_eq!(status.recent_attempt_count, 1);
        assert_eq!(status.last_attempt_ms, Some(0));
        assert_eq!(status.loop_window_ms, 2_000);
        // One attempt in the window: the next one faces 500 * 2^1.
        assert_eq!(status.next_delay_ms, 1_000);
    }
}
