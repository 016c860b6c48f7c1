use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rental_catalog::{
    conflicting_intervals, is_range_available, quote, DateRange, PricingQuote, ReservationInterval,
};
use rental_order::BookingContext;
use rental_shared::{Car, CarListQuery, CarPage, Reservation};
use rental_store::{EntityKind, QueryKey};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    /// Set when checking new dates for an existing reservation.
    reservation_id: Option<i64>,
}

impl RangeQuery {
    fn range(&self) -> Result<DateRange, AppError> {
        DateRange::from_bounds(self.from, self.to).map_err(AppError::from_catalog)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityView {
    available: bool,
    conflicts: Vec<ReservationInterval>,
    /// Every occupied window, for greying out the date picker.
    blocked_ranges: Vec<ReservationInterval>,
    quote: PricingQuote,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars))
        .route("/cars/{id}", get(get_car))
        .route("/cars/{id}/availability", get(check_availability))
        .route("/cars/{id}/quote", get(quote_range))
}

async fn cached_car(state: &AppState, id: i64) -> Result<Car, AppError> {
    state
        .cache
        .get_or_fetch(QueryKey::with_id(EntityKind::Car, id), || state.cars.get_car(id))
        .await
        .map_err(AppError::from_repository)
}

async fn cached_car_reservations(state: &AppState, car_id: i64) -> Result<Vec<Reservation>, AppError> {
    state
        .cache
        .get_or_fetch(QueryKey::with_id(EntityKind::CarReservations, car_id), || {
            state.reservations.list_by_car(car_id)
        })
        .await
        .map_err(AppError::from_repository)
}

async fn cached_context(state: &AppState, car_id: i64) -> Result<BookingContext, AppError> {
    let (car, reservations) = tokio::try_join!(
        cached_car(state, car_id),
        cached_car_reservations(state, car_id),
    )?;
    Ok(BookingContext { car, reservations })
}

async fn list_cars(
    State(state): State<AppState>,
    Query(query): Query<CarListQuery>,
) -> Result<Json<CarPage>, AppError> {
    let page = state
        .cache
        .get_or_fetch(QueryKey::car_listing(&query), || state.cars.list_cars(&query))
        .await
        .map_err(AppError::from_repository)?;
    Ok(Json(page))
}

async fn get_car(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Car>, AppError> {
    Ok(Json(cached_car(&state, id).await?))
}

async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<AvailabilityView>, AppError> {
    let range = query.range()?;
    let context = cached_context(&state, id).await?;

    let blocked_ranges = context.blocked_ranges(query.reservation_id);
    let quote = quote(&range, context.car.price).map_err(AppError::from_catalog)?;

    Ok(Json(AvailabilityView {
        available: is_range_available(&range, &blocked_ranges),
        conflicts: conflicting_intervals(&range, &blocked_ranges),
        blocked_ranges,
        quote,
    }))
}

/// Display estimate only; the backend prices the booking for real.
async fn quote_range(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<PricingQuote>, AppError> {
    let range = query.range()?;
    let car = cached_car(&state, id).await?;
    let quote = quote(&range, car.price).map_err(AppError::from_catalog)?;
    Ok(Json(quote))
}
