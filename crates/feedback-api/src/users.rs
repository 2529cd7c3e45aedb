use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use feedback_core::Session;
use feedback_types::api::ProfileResponse;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// GET /users/{username} — the caller's own profile and feedback.
pub async fn show_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = blocking(move || state.feedback.profile(session.identity(), &username)).await?;

    Ok(Json(ProfileResponse {
        username: profile.user.username,
        email: profile.user.email,
        first_name: profile.user.first_name,
        last_name: profile.user.last_name,
        feedback: profile.feedback,
    }))
}

/// DELETE /users/{username} — removes the account, its feedback and every
/// session it had, which logs the caller out.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, ApiError> {
    blocking(move || state.credentials.delete_account(session.identity(), &username)).await?;
    Ok(StatusCode::NO_CONTENT)
}
