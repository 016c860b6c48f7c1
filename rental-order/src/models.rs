use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use rental_catalog::{DateRange, PricingQuote, ReservationInterval};
use rental_shared::{Car, Reservation, ReservationCommittedEvent, ReservationPayload};

/// Whether a request creates a booking or edits an existing one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingMode {
    Create,
    Update {
        #[serde(rename = "reservationId")]
        reservation_id: i64,
    },
}

/// What the reserve form submits. Dates stay optional until validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub car_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Present when editing an existing reservation.
    #[serde(default)]
    pub reservation_id: Option<i64>,
}

impl ReservationRequest {
    pub fn mode(&self) -> BookingMode {
        match self.reservation_id {
            Some(reservation_id) => BookingMode::Update { reservation_id },
            None => BookingMode::Create,
        }
    }
}

/// A car and its committed bookings, fetched together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingContext {
    pub car: Car,
    pub reservations: Vec<Reservation>,
}

impl BookingContext {
    /// Occupied windows, leaving out the reservation being edited.
    pub fn blocked_ranges(&self, editing: Option<i64>) -> Vec<ReservationInterval> {
        self.reservations
            .iter()
            .filter(|r| Some(r.id) != editing)
            .map(ReservationInterval::from)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    Unavailable {
        conflicts: Vec<ReservationInterval>,
    },
}

/// A validated, priced request, ready to send if the car is free.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPlan {
    pub car_id: i64,
    pub user_id: i64,
    pub mode: BookingMode,
    pub range: DateRange,
    pub quote: PricingQuote,
    pub availability: Availability,
}

impl ReservationPlan {
    pub fn is_bookable(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Backend body for this plan, or `None` when the range is taken.
    pub fn payload(&self) -> Option<ReservationPayload> {
        if !self.is_bookable() {
            return None;
        }

        let id = match self.mode {
            BookingMode::Create => None,
            BookingMode::Update { reservation_id } => Some(reservation_id),
        };

        Some(ReservationPayload {
            id,
            car_id: self.car_id,
            user_id: self.user_id,
            start_date: self.range.from,
            end_date: self.range.to,
            total_price: self.quote.total_price,
        })
    }
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Committed {
        plan: ReservationPlan,
        /// Returned by the backend on update only.
        reservation: Option<Reservation>,
        event: ReservationCommittedEvent,
    },
    /// The range overlaps a committed booking. Nothing was sent.
    Rejected {
        plan: ReservationPlan,
        conflicts: Vec<ReservationInterval>,
    },
}
