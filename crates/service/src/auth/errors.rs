use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("User already exists")]
    Conflict,
    #[error("User not found")]
    NotFound,
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Access denied. Admin privileges required.")]
    Forbidden,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}
