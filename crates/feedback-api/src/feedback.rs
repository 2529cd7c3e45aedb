use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use feedback_core::{Session, require_self};
use feedback_types::api::{CreateFeedbackRequest, UpdateFeedbackRequest};
use feedback_types::models::Feedback;

use crate::auth::AppState;
use crate::error::{ApiError, blocking, malformed};

/// POST /users/{username}/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(session): Extension<Session>,
    body: Result<Json<CreateFeedbackRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_self(session.identity(), &username)?;
    let Json(req) = body.map_err(malformed)?;

    let feedback =
        blocking(move || state.feedback.create(session.identity(), &username, &req)).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// GET /feedback/{id}
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<Json<Feedback>, ApiError> {
    let feedback = blocking(move || state.feedback.get(session.identity(), id)).await?;
    Ok(Json(feedback))
}

/// PUT /feedback/{id} — ownership is checked against the stored row, never
/// against anything the client sends, and before the body is looked at.
pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(session): Extension<Session>,
    body: Result<Json<UpdateFeedbackRequest>, JsonRejection>,
) -> Result<Json<Feedback>, ApiError> {
    let req = body.map(|Json(req)| req).map_err(malformed);

    let feedback = blocking(move || {
        state.feedback.get(session.identity(), id)?;
        state.feedback.update(session.identity(), id, &req?)
    })
    .await?;
    Ok(Json(feedback))
}

/// DELETE /feedback/{id}
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, ApiError> {
    blocking(move || state.feedback.delete(session.identity(), id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
