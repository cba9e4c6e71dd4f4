//! Per-session "analysis in progress" guard.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Header carrying the caller's session id.
pub const SESSION_HEADER: &str = "x-session-id";
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Tracks which sessions currently have an analysis running.
#[derive(Clone, Default)]
pub struct AnalysisGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

impl AnalysisGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `session` busy. Returns `None` if it already is.
    pub fn try_begin(&self, session: &str) -> Option<AnalysisTicket> {
        let mut active = self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(session.to_string()) {
            debug!(session, "analysis rejected: already in progress");
            return None;
        }
        Some(AnalysisTicket {
            session: session.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    #[cfg(test)]
    pub fn is_busy(&self, session: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(session)
    }
}

/// Held for the duration of one analysis; releases the session on drop.
pub struct AnalysisTicket {
    session: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl Drop for AnalysisTicket {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_for_same_session_is_rejected() {
        let guard = AnalysisGuard::new();
        let _ticket = guard.try_begin("alice").unwrap();
        assert!(guard.try_begin("alice").is_none());
        assert!(guard.is_busy("alice"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let guard = AnalysisGuard::new();
        let _alice = guard.try_begin("alice").unwrap();
        assert!(guard.try_begin("bob").is_some());
    }

    #[test]
    fn test_ticket_drop_releases_session() {
        let guard = AnalysisGuard::new();
        {
            let _ticket = guard.try_begin("alice").unwrap();
        }
        assert!(!guard.is_busy("alice"));
        assert!(guard.try_begin("alice").is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = AnalysisGuard::new();
        let clone = guard.clone();
        let _ticket = guard.try_begin("alice").unwrap();
        assert!(clone.is_busy("alice"));
    }
}
