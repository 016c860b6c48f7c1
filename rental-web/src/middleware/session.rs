use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    RequestExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;

use rental_core::session::{evaluate_session, SessionStatus, UnverifiedClaims};

use crate::{error::AppError, state::AppState};

/// Inserted into request extensions once the bearer token passes the expiry check.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub claims: UnverifiedClaims,
}

impl AuthenticatedSession {
    /// Backend user id carried in `sub`.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.claims.sub.parse().map_err(|_| {
            AppError::AuthenticationError(format!("Session subject is not a user id: {}", self.claims.sub))
        })
    }
}

/// Forces a sign-out whenever the bearer token is missing, unreadable or past `exp`.
///
/// The token signature is not checked here; the backend does that on every call.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let sign_out = |reason: &str| {
        tracing::info!("Forcing sign-out: {}", reason);
        AppError::SignOutRequired {
            reason: reason.to_string(),
            login_path: state.session.login_path.clone(),
        }
    };

    let TypedHeader(Authorization(bearer)) = req
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| sign_out("Missing bearer token"))?;

    let claims = match evaluate_session(bearer.token(), Utc::now().timestamp_millis()) {
        SessionStatus::Active(claims) => claims,
        SessionStatus::Expired(_) => return Err(sign_out("Session expired")),
        SessionStatus::Invalid(_) => return Err(sign_out("Invalid session token")),
    };

    req.extensions_mut().insert(AuthenticatedSession { claims });

    Ok(next.run(req).await)
}
