//! Domain error types.

use thiserror::Error;

use super::connection::ConnectionState;

/// Errors raised while constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} is malformed: '{value}'")]
    Malformed { kind: &'static str, value: String },
}

/// Errors reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("membership of user '{user_id}' in room '{room_id}' not found")]
    MembershipNotFound { room_id: String, user_id: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("access token is missing")]
    MissingToken,

    #[error("access token is invalid")]
    InvalidToken,

    #[error("access token has expired")]
    ExpiredToken,

    #[error("access token is malformed")]
    MalformedToken,
}

/// Rejected connection lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connection cannot move from {from:?} to {to:?}")]
pub struct ConnectionStateError {
    pub from: ConnectionState,
    pub to: ConnectionState,
}
