//! Application state shared across all request handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::planner::{PlannerResult, Session, SharedSession, TripController};
use crate::providers::ProviderConfig;

/// Sessions untouched for this long are dropped when a new one opens.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

struct SessionEntry {
    shared: Arc<SharedSession>,
    last_used: Instant,
}

impl SessionEntry {
    fn new(shared: Arc<SharedSession>) -> Self {
        Self {
            shared,
            last_used: Instant::now(),
        }
    }

    /// Idle past `timeout` and not held by any request.
    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_used.elapsed() >= timeout && Arc::strong_count(&self.shared) == 1
    }
}

/// Shared application state.
pub struct AppState {
    /// Dialogue driver shared by every session.
    pub controller: TripController,
    sessions: DashMap<Uuid, SessionEntry>,
    idle_timeout: Duration,
}

impl AppState {
    /// Create application state around an existing controller.
    #[must_use]
    pub fn new(controller: TripController) -> Arc<Self> {
        Arc::new(Self::with_idle_timeout(
            controller,
            DEFAULT_SESSION_IDLE_TIMEOUT,
        ))
    }

    /// Create application state with a custom session idle timeout.
    #[must_use]
    pub fn with_idle_timeout(controller: TripController, idle_timeout: Duration) -> Self {
        Self {
            controller,
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// Create application state backed by the HTTP providers.
    ///
    /// # Errors
    /// Returns an error if the providers cannot be built.
    pub fn from_config(config: &ProviderConfig) -> PlannerResult<Arc<Self>> {
        Ok(Self::new(TripController::from_config(config)?))
    }

    /// Register a new session and return it.
    ///
    /// Idle sessions are pruned first.
    pub fn open_session(&self) -> (Uuid, Arc<SharedSession>) {
        self.cleanup_expired();

        let session = Session::new();
        let id = session.id();
        let shared = Arc::new(SharedSession::new(session));
        self.sessions
            .insert(id, SessionEntry::new(Arc::clone(&shared)));
        tracing::debug!("Opened session {id}");
        (id, shared)
    }

    /// Look up a session by id and mark it as used.
    #[must_use]
    pub fn session(&self, id: &Uuid) -> Option<Arc<SharedSession>> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_used = Instant::now();
            Arc::clone(&entry.shared)
        })
    }

    /// Drop a session. Returns `false` if it was not registered.
    pub fn close_session(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::debug!("Closed session {id}");
        }
        removed
    }

    /// Remove sessions idle past the timeout.
    pub fn cleanup_expired(&self) {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions.retain(|_, entry| !entry.is_expired(timeout));
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            tracing::debug!("Pruned {pruned} idle sessions");
        }
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> TripController {
        match TripController::from_config(&ProviderConfig::default()) {
            Ok(controller) => controller,
            Err(e) => unreachable!("default providers must build: {e}"),
        }
    }

    #[test]
    fn test_close_session() {
        let state = AppState::new(controller());
        let (id, _) = state.open_session();
        assert_eq!(state.session_count(), 1);

        assert!(state.close_session(&id));
        assert!(state.session(&id).is_none());
        assert!(!state.close_session(&id));
        assert_eq!(state.session_count(), 0);
    }

    #[test]
    fn test_idle_sessions_are_pruned_on_open() {
        let state = AppState::with_idle_timeout(controller(), Duration::ZERO);
        let (first, first_handle) = state.open_session();
        drop(first_handle);

        let (second, _second_handle) = state.open_session();
        assert!(state.session(&first).is_none());
        assert!(state.session(&second).is_some());
        assert_eq!(state.session_count(), 1);
    }

    #[test]
    fn test_sessions_in_use_are_not_pruned() {
        let state = AppState::with_idle_timeout(controller(), Duration::ZERO);
        let (first, _held) = state.open_session();

        state.open_session();
        assert!(state.session(&first).is_some());
        assert_eq!(state.session_count(), 2);
    }

    #[test]
    fn test_default_timeout_keeps_fresh_sessions() {
        let state = AppState::new(controller());
        let (first, first_handle) = state.open_session();
        drop(first_handle);

        state.cleanup_expired();
        assert!(state.session(&first).is_some());
    }
}
