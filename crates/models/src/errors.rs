use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    /// A unique constraint rejected the write.
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Db(String),
}

impl From<sea_orm::DbErr> for ModelError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => ModelError::Duplicate(detail),
            _ => ModelError::Db(e.to_string()),
        }
    }
}
