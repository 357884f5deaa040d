//! Navigation outcomes and the user-facing notification surface.
//!
//! Every decided request produces a [`NavOutcome`]. Rejections are plain
//! values, not errors: the shell is expected to surface each one as a
//! visible notice, with emphasis scaled by [`NavOutcome::severity`].

use serde::{Deserialize, Serialize};

use crate::tabs::TabId;

/// Result of a single tab-switch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NavOutcome {
    /// Target already active; nothing to do
    AlreadyActive,
    /// Navigation ran to completion
    Allowed,
    /// Switching too fast; retry after the hint elapses
    Throttled { retry_after_ms: u64 },
    /// A loop was detected; navigation was forced to the safe tab
    LoopBroken { safe_tab: TabId },
    /// The breaker is in cooldown; all navigation is suspended
    Blocked { retry_after_ms: u64 },
    /// A navigation was in flight; this target queued as the follow-up
    Deferred,
}

/// Emphasis a caller should use when surfacing an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    /// No notice needed
    Silent,
    /// Short, transient rate-limit notice
    Notice,
    /// Long-duration, high-emphasis notice: the guard hit its last resort
    Alert,
}

impl NavOutcome {
    /// True for outcomes that must produce a visible notice.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Throttled { .. } | Self::Blocked { .. } | Self::LoopBroken { .. }
        )
    }

    /// How loudly the shell should surface this outcome.
    #[must_use]
    pub fn severity(&self) -> NoticeSeverity {
        match self {
            Self::LoopBroken { .. } => NoticeSeverity::Alert,
            Self::Throttled { .. } | Self::Blocked { .. } => NoticeSeverity::Notice,
            Self::AlreadyActive | Self::Allowed | Self::Deferred => NoticeSeverity::Silent,
        }
    }
}

/// A decided request, delivered to the outcome sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// Requested target tab
    pub target: TabId,
    /// Decision for the request
    pub outcome: NavOutcome,
    /// Clock reading when the decision was made
    pub at_ms: u64,
}

/// Callback receiving every decided request, including deferred
/// follow-ups replayed after an in-flight navigation settles.
pub type OutcomeSink = std::sync::Arc<dyn Fn(&OutcomeEvent) + Send + Sync>;
