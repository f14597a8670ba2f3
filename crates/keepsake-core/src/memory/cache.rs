//! Read-through session cache.
//!
//! `SessionCache` is a concurrent map from handle to that handle's full
//! session history, backed by `DashMap`. Reads return an `Arc` clone so
//! no `DashMap` guard is ever held across an `.await` point, which would
//! deadlock.
//!
//! The cache is purely an optimization: every entry is re-derivable from
//! the session repository, and any write path that touches a handle's
//! sessions calls `invalidate` so the next read refetches.

use std::sync::Arc;

use dashmap::DashMap;
use keepsake_types::error::RepositoryError;
use keepsake_types::handle::Handle;
use keepsake_types::session::SessionWithTurns;

use crate::repository::session::SessionRepository;

/// Concurrent per-handle cache of session histories.
///
/// Cloning produces a shared view of the same underlying data (backed by
/// `Arc`). Two concurrent hydrations of the same handle may both hit the
/// repository; the last insert wins, which is harmless because both read
/// the same source of truth.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    inner: Arc<DashMap<Handle, Arc<Vec<SessionWithTurns>>>>,
}

impl SessionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Get the handle's sessions, fetching from the repository on a miss.
    pub async fn hydrate(
        &self,
        handle: &Handle,
        repo: &impl SessionRepository,
    ) -> Result<Arc<Vec<SessionWithTurns>>, RepositoryError> {
        if let Some(cached) = self.inner.get(handle) {
            return Ok(Arc::clone(cached.value()));
        }
        let sessions = Arc::new(repo.list_sessions_with_turns(handle).await?);
        self.inner.insert(handle.clone(), Arc::clone(&sessions));
        Ok(sessions)
    }

    /// Drop the cached entry for a handle, forcing the next read to refetch.
    pub fn invalidate(&self, handle: &Handle) {
        self.inner.remove(handle);
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use keepsake_types::session::{InterviewSession, SessionStatus, Turn};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// A repository stub that counts bulk reads and serves a fixed history.
    struct CountingRepo {
        sessions: Vec<SessionWithTurns>,
        fetches: AtomicUsize,
    }

    impl CountingRepo {
        fn new(sessions: Vec<SessionWithTurns>) -> Self {
            Self {
                sessions,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl SessionRepository for CountingRepo {
        async fn create_session(
            &self,
            session: &InterviewSession,
        ) -> Result<InterviewSession, RepositoryError> {
            Ok(session.clone())
        }

        async fn get_session(
            &self,
            _session_id: &Uuid,
        ) -> Result<Option<InterviewSession>, RepositoryError> {
            Ok(None)
        }

        async fn get_session_with_turns(
            &self,
            _session_id: &Uuid,
        ) -> Result<Option<SessionWithTurns>, RepositoryError> {
            Ok(None)
        }

        async fn list_sessions(
            &self,
            _handle: Option<&Handle>,
            _limit: Option<i64>,
            _offset: Option<i64>,
        ) -> Result<Vec<InterviewSession>, RepositoryError> {
            Ok(vec![])
        }

        async fn list_sessions_with_turns(
            &self,
            _handle: &Handle,
        ) -> Result<Vec<SessionWithTurns>, RepositoryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.sessions.clone())
        }

        async fn append_turn(&self, _turn: &Turn) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn set_session_handle(
            &self,
            _session_id: &Uuid,
            _handle: &Handle,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn set_session_title(
            &self,
            _session_id: &Uuid,
            _title: Option<&str>,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn set_session_status(
            &self,
            _session_id: &Uuid,
            _status: SessionStatus,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn one_session(handle: &Handle) -> SessionWithTurns {
        SessionWithTurns {
            session: InterviewSession {
                id: Uuid::now_v7(),
                handle: handle.clone(),
                title: None,
                created_at: Utc::now(),
                status: SessionStatus::Completed,
                turn_count: 0,
            },
            turns: vec![],
        }
    }

    #[tokio::test]
    async fn test_hydrate_fetches_once_then_serves_from_cache() {
        let handle = Handle::normalize(Some("margaret"));
        let repo = CountingRepo::new(vec![one_session(&handle)]);
        let cache = SessionCache::new();

        let first = cache.hydrate(&handle, &repo).await.unwrap();
        let second = cache.hydrate(&handle, &repo).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(repo.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let handle = Handle::normalize(Some("margaret"));
        let repo = CountingRepo::new(vec![one_session(&handle)]);
        let cache = SessionCache::new();

        cache.hydrate(&handle, &repo).await.unwrap();
        cache.invalidate(&handle);
        cache.hydrate(&handle, &repo).await.unwrap();

        assert_eq!(repo.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_handles_are_cached_independently() {
        let margaret = Handle::normalize(Some("margaret"));
        let henry = Handle::normalize(Some("henry"));
        let repo = CountingRepo::new(vec![]);
        let cache = SessionCache::new();

        cache.hydrate(&margaret, &repo).await.unwrap();
        cache.hydrate(&henry, &repo).await.unwrap();
        cache.invalidate(&margaret);
        cache.hydrate(&henry, &repo).await.unwrap();

        assert_eq!(repo.fetch_count(), 2);
    }
}
