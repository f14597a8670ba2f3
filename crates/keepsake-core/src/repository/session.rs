//! SessionRepository trait definition.
//!
//! Persistence port for interview sessions and their turns. Follows the
//! same RPITIT pattern as PrimerRepository.

use keepsake_types::error::RepositoryError;
use keepsake_types::handle::Handle;
use keepsake_types::session::{InterviewSession, SessionStatus, SessionWithTurns, Turn};
use uuid::Uuid;

/// Repository trait for interview session and turn persistence.
///
/// Implementations live in keepsake-infra (e.g., `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionRepository: Send + Sync {
    /// Create a new interview session.
    fn create_session(
        &self,
        session: &InterviewSession,
    ) -> impl std::future::Future<Output = Result<InterviewSession, RepositoryError>> + Send;

    /// Get a session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<InterviewSession>, RepositoryError>> + Send;

    /// Get a session together with its full ordered turn sequence.
    fn get_session_with_turns(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<SessionWithTurns>, RepositoryError>> + Send;

    /// List sessions, newest first, optionally filtered by handle.
    fn list_sessions(
        &self,
        handle: Option<&Handle>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<InterviewSession>, RepositoryError>> + Send;

    /// Load every session for a handle with its turns, oldest session first.
    ///
    /// This is the bulk read behind primer rebuilds and cache hydration.
    fn list_sessions_with_turns(
        &self,
        handle: &Handle,
    ) -> impl std::future::Future<Output = Result<Vec<SessionWithTurns>, RepositoryError>> + Send;

    /// Append a turn to its session. Turns are immutable once appended.
    fn append_turn(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Reassign a session to a handle (e.g., at finalize time).
    fn set_session_handle(
        &self,
        session_id: &Uuid,
        handle: &Handle,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set or clear a session's title.
    fn set_session_title(
        &self,
        session_id: &Uuid,
        title: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Transition a session's lifecycle status.
    fn set_session_status(
        &self,
        session_id: &Uuid,
        status: SessionStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
