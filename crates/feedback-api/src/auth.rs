use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use feedback_core::{CredentialHasher, CredentialStore, Error, FeedbackService, Session, Validate};
use feedback_db::Database;
use feedback_types::api::{Claims, LoginRequest, RegisterRequest, SessionResponse};

use crate::error::{ApiError, blocking, malformed};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub credentials: CredentialStore,
    pub feedback: FeedbackService,
    pub jwt_secret: String,
    pub session_ttl_hours: u64,
}

impl AppStateInner {
    pub fn new(
        db: Arc<Database>,
        hasher: Arc<dyn CredentialHasher>,
        jwt_secret: String,
        session_ttl_hours: u64,
    ) -> feedback_core::Result<AppState> {
        Ok(Arc::new(Self {
            credentials: CredentialStore::new(db.clone(), hasher)?,
            feedback: FeedbackService::new(db.clone()),
            db,
            jwt_secret,
            session_ttl_hours,
        }))
    }
}

/// POST /register — create the account and log it in.
pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    if let Some(me) = session.identity() {
        return Ok(Redirect::to(&format!("/users/{me}")).into_response());
    }
    let Json(req) = body.map_err(malformed)?;

    let st = state.clone();
    let user = blocking(move || st.credentials.register(&req)).await?;

    let token = open_session(&state, &user.username).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            username: user.username,
            token,
        }),
    )
        .into_response())
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    if let Some(me) = session.identity() {
        return Ok(Redirect::to(&format!("/users/{me}")).into_response());
    }
    let Json(req) = body.map_err(malformed)?;

    req.validate().map_err(Error::from)?;

    let st = state.clone();
    let user = blocking(move || st.credentials.authenticate(&req.username, &req.password))
        .await?
        .ok_or(Error::InvalidCredentials)?;

    let token = open_session(&state, &user.username).await?;
    info!("User {} logged in", user.username);

    Ok(Json(SessionResponse {
        username: user.username,
        token,
    })
    .into_response())
}

/// POST /logout — drop the server-side session so the token stops working.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, ApiError> {
    let (Some(session_id), Some(username)) = (session.session_id(), session.identity()) else {
        return Err(Error::Unauthorized.into());
    };

    let st = state.clone();
    let sid = session_id.to_string();
    blocking(move || Ok(st.db.delete_session(&sid)?)).await?;

    info!("User {} logged out", username);
    Ok(StatusCode::NO_CONTENT)
}

async fn open_session(state: &AppState, username: &str) -> Result<String, ApiError> {
    let session_id = Uuid::new_v4();

    let st = state.clone();
    let sid = session_id.to_string();
    let name = username.to_string();
    blocking(move || Ok(st.db.create_session(&sid, &name, st.session_ttl_hours)?)).await?;

    create_token(&state.jwt_secret, session_id, username, state.session_ttl_hours)
        .map_err(|e| Error::Internal(e).into())
}

fn create_token(
    secret: &str,
    session_id: Uuid,
    username: &str,
    ttl_hours: u64,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: session_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(ttl_hours as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
