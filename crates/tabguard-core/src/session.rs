//! Single-flight navigation session with newest-wins deferral.
//!
//! At most one navigation transition is in flight at a time. Requests
//! arriving mid-flight collapse into a single pending follow-up: later
//! targets overwrite earlier ones, since an intermediate tab state is
//! stale the moment it is superseded.

use crate::tabs::TabId;

/// Tracks the in-flight navigation and the coalesced follow-up target.
#[derive(Debug, Default)]
pub struct NavigationSession {
    in_progress: bool,
    completed: bool,
    pending_target: Option<TabId>,
}

impl NavigationSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn pending_target(&self) -> Option<&TabId> {
        self.pending_target.as_ref()
    }

    /// Mark a navigation as started.
    pub fn begin(&mut self) {
        self.in_progress = true;
        self.completed = false;
    }

    /// Record `target` as the follow-up once the in-flight navigation
    /// settles. Later calls overwrite earlier ones.
    pub fn defer(&mut self, target: TabId) {
        self.pending_target = Some(target);
    }

    /// Drop any queued follow-up without touching the in-flight state.
    pub fn clear_pending(&mut self) {
        self.pending_target = None;
    }

    /// Mark the in-flight navigation as settled and take the follow-up.
    pub fn finish(&mut self) -> Option<TabId> {
        self.in_progress = false;
        self.completed = true;
        self.pending_target.take()
    }

    /// Back to the fresh baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
