use thiserror::Error;

use crate::hasher::HashError;
use crate::validate::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is per-request and recoverable; none of these should take
/// the process down.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more form fields broke their rules.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("username already taken")]
    Conflict,

    /// Identity missing or not the owner. Also used when the target does not
    /// exist, so callers cannot probe for resources.
    #[error("access denied")]
    Unauthorized,

    /// Unknown username and wrong password both land here.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
