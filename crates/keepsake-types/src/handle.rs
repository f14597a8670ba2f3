//! Interviewee handle type for Keepsake.
//!
//! A handle identifies one person across all of their recording sessions.
//! Sessions recorded before a handle is known are grouped under the
//! reserved `unassigned` handle so their material is never orphaned.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Handle used for sessions that have no interviewee assigned yet.
pub const UNASSIGNED_HANDLE: &str = "unassigned";

/// Normalized identifier for one interviewee.
///
/// Construction always goes through [`Handle::normalize`], which trims,
/// lowercases, and maps empty input to the reserved `unassigned` value.
/// Two handles that normalize identically refer to the same person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Normalize raw handle input into a canonical handle.
    ///
    /// `None`, empty, and whitespace-only input all map to the reserved
    /// `unassigned` handle.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some(s) => {
                let trimmed = s.trim().to_lowercase();
                if trimmed.is_empty() {
                    Self::unassigned()
                } else {
                    Handle(trimmed)
                }
            }
            None => Self::unassigned(),
        }
    }

    /// The reserved handle for sessions with no interviewee assigned.
    pub fn unassigned() -> Self {
        Handle(UNASSIGNED_HANDLE.to_string())
    }

    /// Whether this is the reserved `unassigned` handle.
    pub fn is_unassigned(&self) -> bool {
        self.0 == UNASSIGNED_HANDLE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::unassigned()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}
