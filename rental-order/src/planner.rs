use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use rental_catalog::{conflicting_intervals, quote, CatalogError, DateRange};
use rental_core::repository::{CarRepository, RepositoryError, ReservationRepository};
use rental_shared::{CommitKind, ReservationCommittedEvent};

use crate::models::{
    Availability, BookingContext, BookingMode, ReservationPlan, ReservationRequest, SubmitOutcome,
};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Available plan produced no payload")]
    InconsistentPlan,
}

/// Checks a requested range against a loaded context and prices it.
///
/// When editing, the reservation being edited does not conflict with itself.
pub fn plan_against(
    context: &BookingContext,
    request: &ReservationRequest,
    range: DateRange,
) -> Result<ReservationPlan, CatalogError> {
    let quote = quote(&range, context.car.price)?;
    let blocked = context.blocked_ranges(request.reservation_id);
    let conflicts = conflicting_intervals(&range, &blocked);

    let availability = if conflicts.is_empty() {
        Availability::Available
    } else {
        Availability::Unavailable { conflicts }
    };

    Ok(ReservationPlan {
        car_id: request.car_id,
        user_id: request.user_id,
        mode: request.mode(),
        range,
        quote,
        availability,
    })
}

/// Drives a reservation from form input to a committed backend write.
pub struct ReservationPlanner {
    cars: Arc<dyn CarRepository>,
    reservations: Arc<dyn ReservationRepository>,
    events: broadcast::Sender<ReservationCommittedEvent>,
}

impl ReservationPlanner {
    pub fn new(
        cars: Arc<dyn CarRepository>,
        reservations: Arc<dyn ReservationRepository>,
        events: broadcast::Sender<ReservationCommittedEvent>,
    ) -> Self {
        Self { cars, reservations, events }
    }

    /// Fetches the car and its reservations concurrently.
    pub async fn load_context(&self, car_id: i64) -> Result<BookingContext, BookingError> {
        let (car, reservations) = tokio::try_join!(
            self.cars.get_car(car_id),
            self.reservations.list_by_car(car_id),
        )?;

        debug!("Loaded car {} with {} reservations", car_id, reservations.len());
        Ok(BookingContext { car, reservations })
    }

    /// Validates the dates before any fetch, then checks availability and prices.
    pub async fn plan(&self, request: &ReservationRequest) -> Result<ReservationPlan, BookingError> {
        let range = DateRange::from_bounds(request.start_date, request.end_date)?;
        let context = self.load_context(request.car_id).await?;
        Ok(plan_against(&context, request, range)?)
    }

    /// Plans and, if the range is free, creates or updates the reservation
    /// and announces the commit.
    pub async fn submit(&self, request: &ReservationRequest) -> Result<SubmitOutcome, BookingError> {
        let plan = self.plan(request).await?;

        if let Availability::Unavailable { conflicts } = &plan.availability {
            info!(
                "Car {} unavailable for {} - {}: {} conflicting reservations",
                plan.car_id,
                plan.range.from,
                plan.range.to,
                conflicts.len()
            );
            let conflicts = conflicts.clone();
            return Ok(SubmitOutcome::Rejected { plan, conflicts });
        }

        let payload = plan.payload().ok_or(BookingError::InconsistentPlan)?;

        let (reservation, kind, reservation_id) = match plan.mode {
            BookingMode::Create => {
                self.reservations.create_reservation(&payload).await?;
                (None, CommitKind::Created, None)
            }
            BookingMode::Update { reservation_id } => {
                let updated = self.reservations.update_reservation(reservation_id, &payload).await?;
                (Some(updated), CommitKind::Updated, Some(reservation_id))
            }
        };

        let event = ReservationCommittedEvent {
            reservation_id,
            car_id: plan.car_id,
            user_id: plan.user_id,
            kind,
            total_price: plan.quote.total_price,
            timestamp: Utc::now().timestamp(),
        };

        info!(
            "Reservation {:?} for car {} by user {}: {} days, total {}",
            kind, plan.car_id, plan.user_id, plan.quote.days, plan.quote.total_price
        );

        if self.events.send(event.clone()).is_err() {
            debug!("No listeners for reservation commit events");
        }

        Ok(SubmitOutcome::Committed { plan, reservation, event })
    }
}
