//! Authentication collaborator interface.

use super::{entity::AuthenticatedUser, error::AuthError};

/// Verifies a bearer token and returns the identity it asserts.
#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
