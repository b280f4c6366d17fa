//! Reporting session identity.
//!
//! A `SessionContext` holds the session id (`sid`) and reporting id (`rid`)
//! stamped onto every event a client sends. Both start unset (`0` / empty).
//! The first event built against an unset field latches a generated value;
//! from then on the same value is reused until a caller sets a new one.

use parking_lot::Mutex;

use crate::ids::IdAllocator;

#[derive(Debug, Default, Clone)]
struct SessionState {
    session_id: i64,
    reporting_id: String,
}

/// Session identity owned by one client.
///
/// Lazy initialization happens under a lock, so concurrent first use
/// observes one generated id rather than two.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: Mutex<SessionState>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the session id. `0` clears it, so the next event regenerates one.
    pub fn set_session_id(&self, id: i64) {
        self.state.lock().session_id = id;
    }

    /// Override the reporting id. An empty string clears it.
    pub fn set_reporting_id(&self, id: impl Into<String>) {
        self.state.lock().reporting_id = id.into();
    }

    /// Current session id, `0` if not yet set.
    pub fn session_id(&self) -> i64 {
        self.state.lock().session_id
    }

    /// Current reporting id, empty if not yet set.
    pub fn reporting_id(&self) -> String {
        self.state.lock().reporting_id.clone()
    }

    /// Return `(sid, rid)`, generating whichever is still unset.
    pub fn resolve(&self, ids: &IdAllocator) -> (i64, String) {
        let mut state = self.state.lock();
        if state.session_id == 0 {
            state.session_id = ids.next_id();
        }
        if state.reporting_id.is_empty() {
            state.reporting_id = ids.next_id().to_string();
        }
        (state.session_id, state.reporting_id.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_unset() {
        let session = SessionContext::new();
        assert_eq!(session.session_id(), 0);
        assert!(session.reporting_id().is_empty());
    }

    #[test]
    fn test_resolve_latches_once() {
        let ids = IdAllocator::new();
        let session = SessionContext::new();

        let first = session.resolve(&ids);
        let second = session.resolve(&ids);

        assert_ne!(first.0, 0);
        assert!(!first.1.is_empty());
        assert_eq!(first, second);
        // rid is the decimal form of a generated id
        assert!(first.1.parse::<i64>().is_ok());
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let ids = IdAllocator::new();
        let session = SessionContext::new();
        session.set_session_id(123456);
        session.set_reporting_id("ttttttt-rid");

        let (sid, rid) = session.resolve(&ids);
        assert_eq!(sid, 123456);
        assert_eq!(rid, "ttttttt-rid");
    }

    #[test]
    fn test_partial_override_generates_the_other() {
        let ids = IdAllocator::new();
        let session = SessionContext::new();
        session.set_reporting_id("user-42");

        let (sid, rid) = session.resolve(&ids);
        assert_ne!(sid, 0);
        assert_eq!(rid, "user-42");
    }

    #[test]
    fn test_clearing_regenerates() {
        let ids = IdAllocator::new();
        let session = SessionContext::new();
        let (sid, _) = session.resolve(&ids);

        session.set_session_id(0);
        let (regenerated, _) = session.resolve(&ids);
        assert_ne!(regenerated, 0);
        assert_ne!(regenerated, sid);
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let ids = Arc::new(IdAllocator::new());
        let session = Arc::new(SessionContext::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                let session = Arc::clone(&session);
                std::thread::spawn(move || session.resolve(&ids))
            })
            .collect();

        let seen: Vec<(i64, String)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }
}
