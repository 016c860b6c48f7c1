use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use rental_catalog::{CatalogError, ReservationInterval};
use rental_core::repository::RepositoryError;
use rental_order::BookingError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    /// Session missing, expired or unreadable: the client must sign out
    /// and go to `login_path`.
    SignOutRequired {
        reason: String,
        login_path: String,
    },
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    /// Requested range overlaps committed reservations.
    ConflictError {
        message: String,
        conflicts: Vec<ReservationInterval>,
    },
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFoundError(what),
            RepositoryError::Unauthorized(what) => AppError::AuthenticationError(what),
            RepositoryError::Rejected { status, message } if (400..500).contains(&status) => {
                AppError::ValidationError(message)
            }
            other => AppError::UpstreamError(other.to_string()),
        }
    }

    pub fn from_catalog(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidRange(_) => AppError::ValidationError(err.to_string()),
            // prices come from the backend, not from the client
            CatalogError::InvalidPrice(_) => AppError::UpstreamError(err.to_string()),
        }
    }

    pub fn from_booking(err: BookingError) -> Self {
        match err {
            BookingError::Catalog(e) => Self::from_catalog(e),
            BookingError::Repository(e) => Self::from_repository(e),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::SignOutRequired { reason, login_path } => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": reason, "signOut": true, "redirect": login_path }),
            ),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError { message, conflicts } => (
                StatusCode::CONFLICT,
                json!({ "error": message, "conflicts": conflicts }),
            ),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({ "error": "Booking service unavailable" }))
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
