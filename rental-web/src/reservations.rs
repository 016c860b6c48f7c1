use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rental_catalog::{DateRange, PricingQuote};
use rental_order::{ReservationRequest, SubmitOutcome};
use rental_shared::{CommitKind, Reservation};

use crate::{error::AppError, middleware::AuthenticatedSession, state::AppState};

/// Reserve form body. The user comes from the session, never from the body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReservationForm {
    car_id: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReservationReceipt {
    kind: CommitKind,
    car_id: i64,
    range: DateRange,
    quote: PricingQuote,
    #[serde(skip_serializing_if = "Option::is_none")]
    reservation: Option<Reservation>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reservations", post(create_reservation))
        .route("/reservations/{id}", get(get_reservation).put(update_reservation))
}

async fn submit(
    state: &AppState,
    request: ReservationRequest,
) -> Result<ReservationReceipt, AppError> {
    match state.planner.submit(&request).await.map_err(AppError::from_booking)? {
        SubmitOutcome::Committed { plan, reservation, event } => {
            // the broadcast listener applies it too; this makes the very next read fresh
            state.cache.apply(&event).await;
            Ok(ReservationReceipt {
                kind: event.kind,
                car_id: plan.car_id,
                range: plan.range,
                quote: plan.quote,
                reservation,
            })
        }
        SubmitOutcome::Rejected { conflicts, .. } => Err(AppError::ConflictError {
            message: "The car is already reserved for part of this period".to_string(),
            conflicts,
        }),
    }
}

async fn create_reservation(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    Json(form): Json<ReservationForm>,
) -> Result<(StatusCode, Json<ReservationReceipt>), AppError> {
    let request = ReservationRequest {
        car_id: form.car_id,
        user_id: session.user_id()?,
        start_date: form.start_date,
        end_date: form.end_date,
        reservation_id: None,
    };

    let receipt = submit(&state, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn update_reservation(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    Path(id): Path<i64>,
    Json(form): Json<ReservationForm>,
) -> Result<Json<ReservationReceipt>, AppError> {
    let user_id = session.user_id()?;

    let existing = state
        .reservations
        .get_reservation(id)
        .await
        .map_err(AppError::from_repository)?;
    if existing.user_id != user_id {
        return Err(AppError::AuthorizationError(format!("Reservation {} belongs to another user", id)));
    }

    let request = ReservationRequest {
        car_id: form.car_id,
        user_id,
        start_date: form.start_date,
        end_date: form.end_date,
        reservation_id: Some(id),
    };

    Ok(Json(submit(&state, request).await?))
}

/// Loads a reservation for the edit form.
async fn get_reservation(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    Path(id): Path<i64>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .get_reservation(id)
        .await
        .map_err(AppError::from_repository)?;

    if reservation.user_id != session.user_id()? {
        return Err(AppError::AuthorizationError(format!("Reservation {} belongs to another user", id)));
    }

    Ok(Json(reservation))
}
