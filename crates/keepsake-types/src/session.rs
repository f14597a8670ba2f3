//! Interview session and turn types for Keepsake.
//!
//! These types model one recording session of a spoken interview:
//! the session record, its ordered turns, and the session lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::handle::Handle;

/// Speaker of a turn within an interview session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// Lifecycle status of an interview session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('active', 'completed'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// A single turn within an interview session.
///
/// Turns are immutable once appended and ordered by `created_at`
/// within their session. User turns carry the spoken transcript;
/// assistant turns carry the reply that was read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: TurnRole,
    pub text: String,
    /// Opaque reference to the recorded audio for this turn, if any.
    pub audio_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One recording session of a spoken interview.
///
/// A session belongs to at most one interviewee handle; sessions started
/// before a handle is known live under the reserved `unassigned` handle.
/// Sessions are never deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub handle: Handle,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub turn_count: u32,
}

/// A session hydrated with its full turn sequence.
///
/// This is the shape the continuity engine consumes: question scanning,
/// detail extraction, and primer compilation all walk `turns` in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithTurns {
    pub session: InterviewSession,
    pub turns: Vec<Turn>,
}

impl SessionWithTurns {
    /// Iterate turns by the given role, in session order.
    pub fn turns_with_role(&self, role: TurnRole) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_role_roundtrip() {
        for role in [TurnRole::User, TurnRole::Assistant] {
            let s = role.to_string();
            let parsed: TurnRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_turn_role_serde() {
        let role = TurnRole::Assistant;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: TurnRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TurnRole::Assistant);
    }

    #[test]
    fn test_session_status_roundtrip() {
        for status in [SessionStatus::Active, SessionStatus::Completed] {
            let s = status.to_string();
            let parsed: SessionStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_session_status_default() {
        assert_eq!(SessionStatus::default(), SessionStatus::Active);
    }

    #[test]
    fn test_session_serialize() {
        let session = InterviewSession {
            id: Uuid::now_v7(),
            handle: Handle::normalize(Some("Margaret")),
            title: Some("First recording".to_string()),
            created_at: Utc::now(),
            status: SessionStatus::Active,
            turn_count: 0,
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"status\":\"active\""));
        assert!(json.contains("\"handle\":\"margaret\""));
    }

    #[test]
    fn test_turns_with_role_filters() {
        let session_id = Uuid::now_v7();
        let turn = |role, text: &str| Turn {
            id: Uuid::now_v7(),
            session_id,
            role,
            text: text.to_string(),
            audio_ref: None,
            created_at: Utc::now(),
        };
        let hydrated = SessionWithTurns {
            session: InterviewSession {
                id: session_id,
                handle: Handle::unassigned(),
                title: None,
                created_at: Utc::now(),
                status: SessionStatus::Active,
                turn_count: 3,
            },
            turns: vec![
                turn(TurnRole::Assistant, "Welcome back."),
                turn(TurnRole::User, "I grew up on a farm."),
                turn(TurnRole::Assistant, "What was the farm like?"),
            ],
        };
        let users: Vec<_> = hydrated.turns_with_role(TurnRole::User).collect();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].text, "I grew up on a farm.");
    }
}
