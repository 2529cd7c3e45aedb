use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use feedback_core::{Error, ValidationErrors};
use feedback_types::api::{ErrorResponse, FieldError};

/// Handler error. Wraps the domain error and decides how much of it the
/// client gets to see.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match self.0 {
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation failed",
                errors.into_fields(),
            ),
            Error::Conflict => (
                StatusCode::CONFLICT,
                "username already taken",
                vec![FieldError {
                    field: "username".into(),
                    message: "Username already taken.".into(),
                }],
            ),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "access denied", vec![]),
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid Username/Password", vec![])
            }
            Error::Hash(e) => {
                error!("Password hashing error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error", vec![])
            }
            Error::Internal(e) => {
                error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error", vec![])
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}

/// A body that did not parse is a validation failure like any other.
/// Handlers hold on to the rejection until authorization has passed.
pub fn malformed(rejection: JsonRejection) -> Error {
    Error::Validation(ValidationErrors::single("body", rejection.body_text()))
}

/// Run blocking domain work (SQLite, argon2) off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> feedback_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(Error::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e))))?
        .map_err(ApiError)
}
