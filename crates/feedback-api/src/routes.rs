use axum::{
    Json, Router, middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::feedback;
use crate::middleware::resolve_session;
use crate::users;

/// Every route, with session resolution applied. CORS and tracing layers are
/// left to the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/users/{username}", get(users::show_user).delete(users::delete_user))
        .route("/users/{username}/feedback", post(feedback::create_feedback))
        .route(
            "/feedback/{id}",
            get(feedback::get_feedback)
                .put(feedback::update_feedback)
                .delete(feedback::delete_feedback),
        )
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .with_state(state)
}

async fn home() -> Redirect {
    Redirect::to("/register")
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
