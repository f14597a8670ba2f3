//! Session lifecycle service.
//!
//! Creating, listing, and fetching interview sessions. Handle input is
//! resolved here: absent or blank handles map to the reserved
//! `unassigned` handle, while explicitly naming the reserved handle is
//! rejected as a caller mistake.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use keepsake_types::error::SessionError;
use keepsake_types::handle::{Handle, UNASSIGNED_HANDLE};
use keepsake_types::session::{InterviewSession, SessionStatus, SessionWithTurns};

use crate::memory::cache::SessionCache;
use crate::repository::session::SessionRepository;

/// Resolve raw handle input into a canonical handle.
///
/// `None` and blank input become the reserved `unassigned` handle.
/// Non-blank input that normalizes to the reserved handle is rejected.
pub(crate) fn resolve_handle(raw: Option<&str>) -> Result<Handle, SessionError> {
    match raw {
        Some(s) if !s.trim().is_empty() => {
            let handle = Handle::normalize(Some(s));
            if handle.is_unassigned() {
                return Err(SessionError::ReservedHandle(UNASSIGNED_HANDLE.to_string()));
            }
            Ok(handle)
        }
        _ => Ok(Handle::unassigned()),
    }
}

/// Orchestrates interview session creation and reads.
///
/// Generic over `SessionRepository` to maintain clean architecture
/// (keepsake-core never depends on keepsake-infra).
pub struct SessionService<S: SessionRepository> {
    session_repo: S,
    cache: SessionCache,
}

impl<S: SessionRepository> SessionService<S> {
    /// Create a new session service.
    pub fn new(session_repo: S, cache: SessionCache) -> Self {
        Self {
            session_repo,
            cache,
        }
    }

    /// Start a new interview session.
    ///
    /// The handle is optional; sessions started before the interviewee is
    /// known are grouped under the reserved `unassigned` handle and can be
    /// reassigned at finalize time.
    pub async fn create_session(
        &self,
        handle: Option<&str>,
        title: Option<String>,
    ) -> Result<InterviewSession, SessionError> {
        let handle = resolve_handle(handle)?;
        let session = InterviewSession {
            id: Uuid::now_v7(),
            handle: handle.clone(),
            title,
            created_at: Utc::now(),
            status: SessionStatus::Active,
            turn_count: 0,
        };

        let created = self
            .session_repo
            .create_session(&session)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;
        self.cache.invalidate(&handle);
        info!(session_id = %created.id, handle = %created.handle, "Session started");
        Ok(created)
    }

    /// Get a session by ID.
    pub async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<InterviewSession>, SessionError> {
        self.session_repo
            .get_session(session_id)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))
    }

    /// Get a session with its full ordered turn sequence.
    pub async fn get_session_with_turns(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<SessionWithTurns>, SessionError> {
        self.session_repo
            .get_session_with_turns(session_id)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))
    }

    /// List sessions, newest first, optionally filtered by handle.
    ///
    /// Read paths normalize instead of going through [`resolve_handle`],
    /// so filtering by the reserved handle is allowed here.
    pub async fn list_sessions(
        &self,
        handle: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<InterviewSession>, SessionError> {
        let handle = handle.map(|raw| Handle::normalize(Some(raw)));
        self.session_repo
            .list_sessions(handle.as_ref(), limit, offset)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_handle_blank_is_unassigned() {
        assert!(resolve_handle(None).unwrap().is_unassigned());
        assert!(resolve_handle(Some("")).unwrap().is_unassigned());
        assert!(resolve_handle(Some("   ")).unwrap().is_unassigned());
    }

    #[test]
    fn test_resolve_handle_normalizes() {
        let handle = resolve_handle(Some("  Margaret ")).unwrap();
        assert_eq!(handle.as_str(), "margaret");
    }

    #[test]
    fn test_resolve_handle_rejects_reserved() {
        let err = resolve_handle(Some("Unassigned")).unwrap_err();
        assert!(matches!(err, SessionError::ReservedHandle(_)));
    }
}
