use std::fmt::Display;

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::WithRejection;
use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use service::storage::StorageError;
use thiserror::Error;
use tracing::error;

/// JSON body extractor whose rejections render as [`JsonApiError`].
pub type ApiJson<T> = WithRejection<Json<T>, JsonApiError>;

/// Path extractor whose rejections render as [`JsonApiError`].
pub type ApiPath<T> = WithRejection<Path<T>, JsonApiError>;

/// Error response rendered as `{"message": "..."}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn unauthorized(message: impl Into<String>) -> Self { Self::new(StatusCode::UNAUTHORIZED, message) }

    pub fn forbidden() -> Self { Self::new(StatusCode::FORBIDDEN, AuthError::Forbidden.to_string()) }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, message) }

    /// Log the cause; clients only see a generic message.
    pub fn internal(cause: impl Display) -> Self {
        error!(error = %cause, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "message": self.message }))).into_response()
    }
}

impl From<StorageError> for JsonApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidType => JsonApiError::bad_request(e.to_string()),
            StorageError::TooLarge { .. } => JsonApiError::new(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
            StorageError::Io(_) => JsonApiError::internal(e),
        }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => JsonApiError::bad_request(msg),
            ServiceError::Model(ModelError::Validation(msg)) => JsonApiError::bad_request(msg),
            ServiceError::NotFound(msg) => JsonApiError::not_found(msg),
            ServiceError::Conflict(msg) => JsonApiError::new(StatusCode::CONFLICT, msg),
            ServiceError::Model(ModelError::Duplicate(_)) => JsonApiError::new(StatusCode::CONFLICT, "Resource already exists"),
            ServiceError::Storage(s) => s.into(),
            other @ (ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_))) => JsonApiError::internal(other),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => JsonApiError::bad_request(msg),
            AuthError::Conflict => JsonApiError::new(StatusCode::CONFLICT, e.to_string()),
            AuthError::NotFound => JsonApiError::not_found(e.to_string()),
            AuthError::Unauthorized => JsonApiError::unauthorized(e.to_string()),
            AuthError::Forbidden => JsonApiError::forbidden(),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => JsonApiError::internal(e),
        }
    }
}

impl From<MultipartError> for JsonApiError {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        if status.is_server_error() {
            JsonApiError::internal(e.body_text())
        } else {
            JsonApiError::new(status, e.body_text())
        }
    }
}

// Malformed bodies are client errors; axum reports some of them as 422.
impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self {
        match r.status() {
            StatusCode::UNPROCESSABLE_ENTITY => JsonApiError::bad_request(r.body_text()),
            s if s.is_server_error() => JsonApiError::internal(r.body_text()),
            s => JsonApiError::new(s, r.body_text()),
        }
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self {
        let status = r.status();
        if status.is_server_error() {
            JsonApiError::internal(r.body_text())
        } else {
            JsonApiError::new(status, r.body_text())
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("version required".into()), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("Deployment"), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("Version already exists for this service".into()), StatusCode::CONFLICT),
            (ServiceError::Storage(StorageError::InvalidType), StatusCode::BAD_REQUEST),
            (ServiceError::Storage(StorageError::TooLarge { limit: 1 }), StatusCode::PAYLOAD_TOO_LARGE),
            (ServiceError::Db("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let e = JsonApiError::from(ServiceError::Db("password=hunter2".into()));
        assert_eq!(e.message, "Server error");
    }

    #[test]
    fn auth_errors_keep_user_facing_messages() {
        let e = JsonApiError::from(AuthError::Unauthorized);
        assert_eq!((e.status, e.message.as_str()), (StatusCode::UNAUTHORIZED, "Invalid credentials"));
        let e = JsonApiError::from(AuthError::Conflict);
        assert_eq!((e.status, e.message.as_str()), (StatusCode::CONFLICT, "User already exists"));
        let e = JsonApiError::from(AuthError::Forbidden);
        assert_eq!(e.message, "Access denied. Admin privileges required.");
    }
}
