//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `keepsake-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool, writes on the single-connection writer pool.
//!
//! `turn_count` is not stored; it is computed with a COUNT subquery so the
//! value can never drift from the turns table.

use keepsake_core::repository::session::SessionRepository;
use keepsake_types::error::RepositoryError;
use keepsake_types::handle::Handle;
use keepsake_types::session::{InterviewSession, SessionStatus, SessionWithTurns, Turn, TurnRole};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use std::collections::HashMap;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str = "s.id, s.handle, s.title, s.created_at, s.status, \
     (SELECT COUNT(*) FROM turns t WHERE t.session_id = s.id) AS turn_count";

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain InterviewSession.
struct SessionRow {
    id: String,
    handle: String,
    title: Option<String>,
    created_at: String,
    status: String,
    turn_count: i64,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            handle: row.try_get("handle")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            status: row.try_get("status")?,
            turn_count: row.try_get("turn_count")?,
        })
    }

    fn into_session(self) -> Result<InterviewSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let status: SessionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(InterviewSession {
            id,
            handle: Handle::normalize(Some(&self.handle)),
            title: self.title,
            created_at,
            status,
            turn_count: self.turn_count as u32,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Turn.
struct TurnRow {
    id: String,
    session_id: String,
    role: String,
    text: String,
    audio_ref: Option<String>,
    created_at: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            text: row.try_get("text")?,
            audio_ref: row.try_get("audio_ref")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid turn id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let role: TurnRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Turn {
            id,
            session_id,
            role,
            text: self.text,
            audio_ref: self.audio_ref,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn sessions_from_rows(
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<InterviewSession>, RepositoryError> {
    let mut sessions = Vec::with_capacity(rows.len());
    for row in rows {
        let session_row =
            SessionRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        sessions.push(session_row.into_session()?);
    }
    Ok(sessions)
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(
        &self,
        session: &InterviewSession,
    ) -> Result<InterviewSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO sessions (id, handle, title, created_at, status)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.handle.as_str())
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(session.status.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<InterviewSession>, RepositoryError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions s WHERE s.id = ?");
        let row = sqlx::query(&sql)
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn get_session_with_turns(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<SessionWithTurns>, RepositoryError> {
        let Some(session) = self.get_session(session_id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            "SELECT * FROM turns WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in &rows {
            let turn_row =
                TurnRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            turns.push(turn_row.into_turn()?);
        }

        Ok(Some(SessionWithTurns { session, turns }))
    }

    async fn list_sessions(
        &self,
        handle: Option<&Handle>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<InterviewSession>, RepositoryError> {
        let mut sql = format!("SELECT {SESSION_COLUMNS} FROM sessions s");
        if handle.is_some() {
            sql.push_str(" WHERE s.handle = ?");
        }
        sql.push_str(" ORDER BY s.created_at DESC, s.id DESC");

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(handle) = handle {
            query = query.bind(handle.as_str().to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sessions_from_rows(&rows)
    }

    async fn list_sessions_with_turns(
        &self,
        handle: &Handle,
    ) -> Result<Vec<SessionWithTurns>, RepositoryError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions s WHERE s.handle = ? \
             ORDER BY s.created_at ASC, s.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(handle.as_str().to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let sessions = sessions_from_rows(&rows)?;

        // One bulk turn query instead of one per session.
        let turn_rows = sqlx::query(
            r#"SELECT t.* FROM turns t
               JOIN sessions s ON s.id = t.session_id
               WHERE s.handle = ?
               ORDER BY t.created_at ASC, t.id ASC"#,
        )
        .bind(handle.as_str().to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut by_session: HashMap<Uuid, Vec<Turn>> = HashMap::new();
        for row in &turn_rows {
            let turn_row =
                TurnRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            let turn = turn_row.into_turn()?;
            by_session.entry(turn.session_id).or_default().push(turn);
        }

        Ok(sessions
            .into_iter()
            .map(|session| {
                let turns = by_session.remove(&session.id).unwrap_or_default();
                SessionWithTurns { session, turns }
            })
            .collect())
    }

    async fn append_turn(&self, turn: &Turn) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO turns (id, session_id, role, text, audio_ref, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(turn.session_id.to_string())
        .bind(turn.role.to_string())
        .bind(&turn.text)
        .bind(&turn.audio_ref)
        .bind(format_datetime(&turn.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn set_session_handle(
        &self,
        session_id: &Uuid,
        handle: &Handle,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE sessions SET handle = ? WHERE id = ?")
            .bind(handle.as_str())
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_session_title(
        &self,
        session_id: &Uuid,
        title: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE sessions SET title = ? WHERE id = ?")
            .bind(title)
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_session_status(
        &self,
        session_id: &Uuid,
        status: SessionStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE sessions SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
