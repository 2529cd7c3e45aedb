use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{debug, error};

use feedback_core::Session;
use feedback_types::api::Claims;

use crate::auth::AppState;

/// Resolve the bearer token into a [`Session`] and stash it in the request
/// extensions. Never rejects: a missing, forged, expired or logged-out token
/// just yields an anonymous session, and handlers decide what that means.
pub async fn resolve_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let session = match bearer_token(req.headers()) {
        Some(token) => lookup(&state, token).await,
        None => Session::Anonymous,
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

async fn lookup(state: &AppState, token: &str) -> Session {
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data.claims,
        Err(e) => {
            debug!("Rejected session token: {}", e);
            return Session::Anonymous;
        }
    };

    let st = state.clone();
    let sid = claims.sub.to_string();
    let live = tokio::task::spawn_blocking(move || st.db.session_username(&sid)).await;

    match live {
        Ok(Ok(Some(username))) if username == claims.username => {
            Session::authenticated(claims.sub.to_string(), username)
        }
        Ok(Ok(_)) => {
            debug!("Session {} is gone or expired", claims.sub);
            Session::Anonymous
        }
        Ok(Err(e)) => {
            error!("Session lookup failed: {:#}", e);
            Session::Anonymous
        }
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            Session::Anonymous
        }
    }
}
