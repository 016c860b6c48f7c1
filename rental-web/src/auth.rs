use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use rental_core::session::{is_session_expired, peek_unverified_claims, UnverifiedClaims};
use rental_shared::{Credentials, Masked};

use crate::{error::AppError, middleware::AuthenticatedSession, state::AppState};

/// What the client keeps about the signed-in user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Masked<String>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

impl SessionView {
    fn new(claims: &UnverifiedClaims, now_ms: i64) -> Self {
        Self {
            user_id: claims.sub.clone(),
            username: claims.username.clone(),
            email: None,
            access_token: None,
            expires_at: DateTime::from_timestamp_millis(claims.expires_at_ms()),
            is_expired: is_session_expired(claims, now_ms),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Needs the session middleware.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/session", get(current_session))
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionView>, AppError> {
    if credentials.is_blank() {
        return Err(AppError::ValidationError("Email and password are required".to_string()));
    }

    let token = state
        .identity
        .login(&credentials)
        .await
        .map_err(AppError::from_repository)?;

    let claims = peek_unverified_claims(&token).map_err(|e| {
        tracing::warn!("Identity provider returned an unreadable token: {}", e);
        AppError::UpstreamError(e.to_string())
    })?;

    tracing::info!("User {} signed in", claims.sub);

    let mut view = SessionView::new(&claims, Utc::now().timestamp_millis());
    view.email = Some(credentials.email);
    view.access_token = Some(Masked(token));
    Ok(Json(view))
}

async fn current_session(Extension(session): Extension<AuthenticatedSession>) -> Json<SessionView> {
    Json(SessionView::new(&session.claims, Utc::now().timestamp_millis()))
}
