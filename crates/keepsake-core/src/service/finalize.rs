//! Finalize service: session completion and primer lifecycle.
//!
//! Finalizing a session assigns its handle and title, marks it
//! completed, and rebuilds that handle's memory primer from scratch.
//! Rebuilds for the same handle are serialized through a per-handle
//! async mutex; rebuilds for different handles run freely in parallel.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use keepsake_types::config::EngineConfig;
use keepsake_types::error::SessionError;
use keepsake_types::handle::Handle;
use keepsake_types::memory::MemoryPrimer;
use keepsake_types::session::{InterviewSession, SessionStatus};

use crate::memory::cache::SessionCache;
use crate::memory::primer::compile_primer;
use crate::repository::primer::PrimerRepository;
use crate::repository::session::SessionRepository;

use super::session::resolve_handle;

/// Orchestrates session finalization and memory primer rebuilds.
///
/// Generic over the repository traits to maintain clean architecture
/// (keepsake-core never depends on keepsake-infra).
pub struct FinalizeService<S: SessionRepository, P: PrimerRepository> {
    session_repo: S,
    primer_repo: P,
    cache: SessionCache,
    engine_config: EngineConfig,
    rebuild_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: SessionRepository, P: PrimerRepository> FinalizeService<S, P> {
    /// Create a new finalize service.
    pub fn new(
        session_repo: S,
        primer_repo: P,
        cache: SessionCache,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            session_repo,
            primer_repo,
            cache,
            engine_config,
            rebuild_locks: DashMap::new(),
        }
    }

    /// Finalize a session: assign handle and title, mark completed,
    /// rebuild the handle's primer.
    ///
    /// The primer rebuild is best-effort: the session's new state is the
    /// durable truth, and a failed rebuild only leaves a stale primer
    /// that the next rebuild repairs.
    #[tracing::instrument(
        name = "finalize_session",
        skip(self, title),
        fields(session_id = %session_id)
    )]
    pub async fn finalize(
        &self,
        session_id: &Uuid,
        handle: Option<&str>,
        title: Option<String>,
    ) -> Result<InterviewSession, SessionError> {
        let session = self
            .session_repo
            .get_session(session_id)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?
            .ok_or(SessionError::NotFound)?;
        if session.status == SessionStatus::Completed {
            return Err(SessionError::AlreadyCompleted);
        }

        let target_handle = match handle {
            Some(raw) if !raw.trim().is_empty() => resolve_handle(Some(raw))?,
            _ => session.handle.clone(),
        };
        if target_handle != session.handle {
            self.session_repo
                .set_session_handle(session_id, &target_handle)
                .await
                .map_err(|e| SessionError::StorageError(e.to_string()))?;
            self.cache.invalidate(&session.handle);
        }
        if let Some(title) = &title {
            self.session_repo
                .set_session_title(session_id, Some(title))
                .await
                .map_err(|e| SessionError::StorageError(e.to_string()))?;
        }
        self.session_repo
            .set_session_status(session_id, SessionStatus::Completed)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;
        self.cache.invalidate(&target_handle);
        info!(session_id = %session_id, handle = %target_handle, "Session finalized");

        if let Err(err) = self.rebuild_primer(&target_handle).await {
            warn!(
                handle = %target_handle,
                error = %err,
                "primer rebuild failed; primer is stale until the next rebuild"
            );
        }

        self.session_repo
            .get_session(session_id)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?
            .ok_or(SessionError::NotFound)
    }

    /// Rebuild and store the primer for a handle from its full history.
    ///
    /// Serialized per handle: a second rebuild for the same handle waits
    /// for the first to finish, so concurrent finalizes cannot interleave
    /// their gather and store steps.
    #[tracing::instrument(name = "rebuild_primer", skip(self), fields(handle = %handle))]
    pub async fn rebuild_primer(&self, handle: &Handle) -> Result<MemoryPrimer, SessionError> {
        let lock = self
            .rebuild_locks
            .entry(handle.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        // Always gather from the repository, never the cache: the rebuild
        // must see its own handle's freshest rows.
        let sessions = self
            .session_repo
            .list_sessions_with_turns(handle)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;
        let markdown = compile_primer(
            handle,
            &sessions,
            &self.engine_config.stage_taxonomy,
            self.engine_config.min_detail_len,
        );
        let primer = MemoryPrimer {
            handle: handle.clone(),
            markdown,
            updated_at: Utc::now(),
        };
        self.primer_repo
            .upsert_primer(&primer)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))?;
        info!(handle = %handle, sessions = sessions.len(), "Primer rebuilt");
        Ok(primer)
    }

    /// Fetch the stored primer for a handle, if one has been compiled.
    ///
    /// Read path: the reserved handle may be named explicitly here.
    pub async fn primer(&self, handle: &str) -> Result<Option<MemoryPrimer>, SessionError> {
        let handle = Handle::normalize(Some(handle));
        self.primer_repo
            .get_primer(&handle)
            .await
            .map_err(|e| SessionError::StorageError(e.to_string()))
    }
}
