use thiserror::Error;

/// Errors related to interview session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session is already completed")]
    AlreadyCompleted,

    #[error("'{0}' is a reserved handle")]
    ReservedHandle(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from repository operations (used by trait definitions in keepsake-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::ReservedHandle("unassigned".to_string());
        assert_eq!(err.to_string(), "'unassigned' is a reserved handle");
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "entity not found");
    }
}
