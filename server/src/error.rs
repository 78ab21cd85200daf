//! Error taxonomy shared by the engine, the stores and the HTTP layer.

use thiserror::Error;

use crate::league::ranking::RANKING_TAKEN;

/// Coarse classification the request layer maps onto response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum LeagueError {
    /// Malformed input, self-referential match, unknown status filter.
    #[error("{0}")]
    Validation(String),
    /// Ranking collision or double booking.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store failure: {0}")]
    Store(#[source] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl LeagueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeagueError::Validation(_) => ErrorKind::Validation,
            LeagueError::Conflict(_) => ErrorKind::Conflict,
            LeagueError::NotFound(_) => ErrorKind::NotFound,
            LeagueError::Store(_) | LeagueError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        LeagueError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        LeagueError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        LeagueError::NotFound(msg.into())
    }
}

/// Postgres SQLSTATE codes that carry domain meaning.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for LeagueError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) if db_err.constraint() == Some("players_ranking_key") => {
                    return LeagueError::conflict(RANKING_TAKEN);
                }
                Some(UNIQUE_VIOLATION) => return LeagueError::conflict("duplicate value"),
                Some(FOREIGN_KEY_VIOLATION) => {
                    return LeagueError::conflict("player is referenced by existing matches");
                }
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                    return LeagueError::conflict("concurrent update on the same resources, retry");
                }
                _ => {}
            }
        }
        LeagueError::Store(err)
    }
}
