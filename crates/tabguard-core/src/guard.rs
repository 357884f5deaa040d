//! Tab-switch mediation: throttle, break, and sequence navigation.
//!
//! [`TabNavigationGuard`] owns the throttle tracker, the circuit breaker,
//! and the single-flight session as one unit behind a cloneable handle,
//! so nothing outside the guard can mutate them out from under each
//! other. The UI shell injects the [`Navigator`] and [`Refresher`]
//! capabilities and routes every tab activation through
//! [`TabNavigationGuard::request_tab_change`].
//!
//! Request handling order for each target:
//!
//! 1. same-target no-op
//! 2. circuit breaker cooldown check
//! 3. loop detection (attempt is counted)
//! 4. exponential throttle check
//! 5. single-flight deferral (newest wins)
//! 6. navigation side effect + optional data refresh
//! 7. settle and replay the coalesced follow-up, if any

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::clock::Clock;
use crate::config::GuardConfig;
use crate::error::{Error, Result};
use crate::events::{NavOutcome, OutcomeEvent, OutcomeSink};
use crate::session::NavigationSession;
use crate::tabs::{TabId, TabRegistry};
use crate::throttle::{LoopVerdict, ThrottleTracker};

/// Future returned by the refresh capability.
pub type RefreshFuture = Pin<Box<dyn Future<Output = std::result::Result<(), String>> + Send>>;

/// URL/history capability injected by the UI shell.
pub trait Navigator: Send + Sync {
    /// Perform the underlying URL/history change. `replace` substitutes
    /// the current history entry instead of pushing a new one.
    fn perform_navigation(&self, path: &str, replace: bool) -> Result<()>;

    /// Current location (path plus query string), consulted only for the
    /// recovery-mode signal.
    fn location(&self) -> String;
}

/// Data refresh capability for tabs that declare `requires_refresh`.
///
/// A rejected refresh never blocks the navigation from settling; the
/// guard logs it and moves on. Surfacing the data-layer failure is the
/// shell's concern.
pub trait Refresher: Send + Sync {
    fn refresh(&self) -> RefreshFuture;
}

/// Diagnostic snapshot for status overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardStatus {
    /// A loop was detected and its forced break is still in force
    pub loop_detected: bool,
    /// All navigation is currently suspended
    pub circuit_breaker_active: bool,
    /// Attempts inside the detection window
    pub recent_attempt_count: u32,
    /// Clock reading of the last begun navigation
    pub last_navigation_ms: Option<u64>,
    /// Time left in the cooldown, when active
    pub cooldown_remaining_ms: Option<u64>,
    /// A navigation transition is in flight
    pub in_progress: bool,
    /// The last navigation ran to completion
    pub completed: bool,
    /// Coalesced follow-up target, when one is queued
    pub pending_target: Option<TabId>,
    /// Tab the guard currently considers active
    pub active_tab: Option<TabId>,
}

#[derive(Debug)]
struct GuardInner {
    tracker: ThrottleTracker,
    breaker: CircuitBreaker,
    session: NavigationSession,
    active_tab: Option<TabId>,
    loop_detected: bool,
    last_navigation_ms: Option<u64>,
}

/// Synchronous decision taken under the lock; side effects run after it
/// is released.
enum Step {
    Reject(NavOutcome),
    Defer,
    BreakLoop,
    Begin { path: String, requires_refresh: bool },
}

/// Mediates all tab-switch requests for one mounted navigation surface.
#[derive(Clone)]
pub struct TabNavigationGuard {
    config: GuardConfig,
    registry: Arc<TabRegistry>,
    navigator: Arc<dyn Navigator>,
    refresher: Arc<dyn Refresher>,
    clock: Arc<dyn Clock>,
    sink: Option<OutcomeSink>,
    inner: Arc<Mutex<GuardInner>>,
}

impl TabNavigationGuard {
    /// Build a guard from its configuration, tab registry, and injected
    /// capabilities. Explicitly constructed and owned: there is no
    /// process-wide instance.
    pub fn new(
        config: GuardConfig,
        registry: TabRegistry,
        navigator: Arc<dyn Navigator>,
        refresher: Arc<dyn Refresher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let inner = GuardInner {
            tracker: ThrottleTracker::new(&config),
            breaker: CircuitBreaker::new("navigation", config.cooldown_ms),
            session: NavigationSession::new(),
            active_tab: None,
            loop_detected: false,
            last_navigation_ms: None,
        };
        Ok(Self {
            config,
            registry: Arc::new(registry),
            navigator,
            refresher,
            clock,
            sink: None,
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    /// Install the outcome sink used for user-facing notifications.
    #[must_use]
    pub fn with_outcome_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&OutcomeEvent) + Send + Sync + 'static,
    {
        let sink: OutcomeSink = Arc::new(sink);
        self.sink = Some(sink);
        self
    }

    /// Seed the currently active tab (e.g., from the initial route).
    #[must_use]
    pub fn with_active_tab(self, tab: TabId) -> Self {
        self.lock_inner().active_tab = Some(tab);
        self
    }

    /// Mediate a tab activation request end to end.
    ///
    /// Expected control-flow rejections come back as [`NavOutcome`]
    /// values. Only a failing navigation primitive propagates as an
    /// error, since there is no recovery strategy for a broken router.
    pub async fn request_tab_change(&self, target: &TabId) -> Result<NavOutcome> {
        let (first, mut follow_up) = self.process_one(target).await?;
        self.emit(target, &first);

        // Replay the coalesced follow-up recorded while a navigation was
        // in flight; its outcome reaches the caller via the sink.
        while let Some(next) = follow_up {
            tokio::time::sleep(Duration::from_millis(self.config.pending_debounce_ms)).await;
            debug!(tab = %next, "replaying deferred navigation target");
            let (outcome, deferred) = self.process_one(&next).await?;
            self.emit(&next, &outcome);
            follow_up = deferred;
        }

        Ok(first)
    }

    /// Decide and execute a single request; returns its outcome and the
    /// pending target taken when this navigation settled.
    async fn process_one(&self, target: &TabId) -> Result<(NavOutcome, Option<TabId>)> {
        let now = self.clock.now_ms();

        let step = {
            let mut inner = self.lock_inner();

            // Same-target requests mutate nothing at all.
            if inner.active_tab.as_ref() == Some(target) {
                return Ok((NavOutcome::AlreadyActive, None));
            }

            // Unknown targets are caller bugs; they don't count as attempts.
            let spec = self
                .registry
                .get(target)
                .ok_or_else(|| Error::UnknownTab(target.to_string()))?;

            if inner.breaker.is_active(now) {
                let retry_after_ms = inner.breaker.cooldown_remaining_ms(now).unwrap_or(0);
                Step::Reject(NavOutcome::Blocked { retry_after_ms })
            } else {
                // The forced break ends with the cooldown.
                inner.loop_detected = false;

                match inner.tracker.record_attempt(now) {
                    LoopVerdict::LoopDetected => Step::BreakLoop,
                    LoopVerdict::Allowed => {
                        let retry_after_ms = inner.tracker.throttle_remaining_ms(now);
                        if retry_after_ms > 0 {
                            Step::Reject(NavOutcome::Throttled { retry_after_ms })
                        } else if inner.session.in_progress() {
                            inner.session.defer(target.clone());
                            Step::Defer
                        } else {
                            inner.session.begin();
                            // Optimistic: the UI reflects the switch before
                            // any asynchronous side effect resolves.
                            inner.active_tab = Some(target.clone());
                            inner.last_navigation_ms = Some(now);
                            Step::Begin {
                                path: spec.path.clone(),
                                requires_refresh: spec.requires_refresh,
                            }
                        }
                    }
                }
            }
        };

        match step {
            Step::Reject(outcome) => {
                debug!(tab = %target, outcome = ?outcome, "navigation rejected");
                Ok((outcome, None))
            }
            Step::Defer => {
                debug!(tab = %target, "navigation in flight, target deferred");
                Ok((NavOutcome::Deferred, None))
            }
            Step::BreakLoop => {
                let outcome = self.break_loop(now)?;
                Ok((outcome, None))
            }
            Step::Begin {
                path,
                requires_refresh,
            } => self.run_navigation(target, &path, requires_refresh).await,
        }
    }

    /// Execute the navigation side effects for an admitted request.
    async fn run_navigation(
        &self,
        target: &TabId,
        path: &str,
        requires_refresh: bool,
    ) -> Result<(NavOutcome, Option<TabId>)> {
        // The recovery signal in the current URL selects a minimal
        // navigation that cannot re-enter the loop it escapes from:
        // replace-style, no refresh.
        let recovery = self.in_recovery_mode();
        let replace = recovery;

        if let Err(err) = self.navigator.perform_navigation(path, replace) {
            // A broken navigation primitive is unrecoverable, but the
            // session must not stay wedged in-flight behind it.
            self.lock_inner().session.reset();
            return Err(err);
        }

        if requires_refresh && !recovery {
            if let Err(err) = self.refresher.refresh().await {
                // Forward progress is guaranteed even when the data layer
                // fails; the shell surfaces refresh errors separately.
                warn!(tab = %target, error = %err, "post-navigation refresh failed");
            }
        }

        let pending = self.lock_inner().session.finish();
        Ok((NavOutcome::Allowed, pending))
    }

    /// Last-resort stop: suspend all navigation and force the safe tab.
    fn break_loop(&self, now_ms: u64) -> Result<NavOutcome> {
        let safe = self.registry.safe_tab().clone();
        {
            let mut inner = self.lock_inner();
            inner.breaker.trip(now_ms);
            // Clearing the history here keeps the cooldown from
            // re-triggering the instant it expires.
            inner.tracker.reset();
            inner.session.clear_pending();
            inner.loop_detected = true;
            inner.active_tab = Some(safe.id.clone());
            inner.last_navigation_ms = Some(now_ms);
        }
        warn!(
            safe_tab = %safe.id,
            cooldown_ms = self.config.cooldown_ms,
            "navigation loop detected, forcing safe tab"
        );
        // Replace-style so the loop's history entries can't replay on back.
        self.navigator.perform_navigation(&safe.path, true)?;
        Ok(NavOutcome::LoopBroken { safe_tab: safe.id })
    }

    /// Diagnostic snapshot for status overlays.
    #[must_use]
    pub fn status(&self) -> GuardStatus {
        let now = self.clock.now_ms();
        let mut inner = self.lock_inner();
        let circuit_breaker_active = inner.breaker.is_active(now);
        if !circuit_breaker_active {
            inner.loop_detected = false;
        }
        GuardStatus {
            loop_detected: inner.loop_detected,
            circuit_breaker_active,
            recent_attempt_count: inner.tracker.recent_attempt_count(now),
            last_navigation_ms: inner.last_navigation_ms,
            cooldown_remaining_ms: inner.breaker.cooldown_remaining_ms(now),
            in_progress: inner.session.in_progress(),
            completed: inner.session.completed(),
            pending_target: inner.session.pending_target().cloned(),
            active_tab: inner.active_tab.clone(),
        }
    }

    /// Tab the guard currently considers active.
    #[must_use]
    pub fn active_tab(&self) -> Option<TabId> {
        self.lock_inner().active_tab.clone()
    }

    /// Operator force-reset: tracker, breaker, and session back to the
    /// fresh baseline. With lazy cooldown expiry there is no pending
    /// timer left to cancel.
    pub fn reset(&self) {
        let mut inner = self.lock_inner();
        inner.tracker.reset();
        inner.breaker.reset();
        inner.session.reset();
        inner.loop_detected = false;
        inner.last_navigation_ms = None;
        debug!("navigation guard reset");
    }

    fn in_recovery_mode(&self) -> bool {
        let location = self.navigator.location();
        let Some((_, query)) = location.split_once('?') else {
            return false;
        };
        query.split('&').any(|pair| match pair.split_once('=') {
            Some((key, value)) => {
                key == self.config.recovery_param && matches!(value, "1" | "true")
            }
            None => pair == self.config.recovery_param,
        })
    }

    fn emit(&self, target: &TabId, outcome: &NavOutcome) {
        if let Some(sink) = self.sink.as_deref() {
            let event = OutcomeEvent {
                target: target.clone(),
                outcome: outcome.clone(),
                at_ms: self.clock.now_ms(),
            };
            sink(&event);
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, GuardInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
