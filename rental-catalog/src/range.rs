use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rental_shared::Reservation;

use crate::{CatalogError, CatalogResult};

/// Requested rental period, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> CatalogResult<Self> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    /// Builds a range from possibly missing picker bounds.
    pub fn from_bounds(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> CatalogResult<Self> {
        match (from, to) {
            (Some(from), Some(to)) => Self::new(from, to),
            (None, _) => Err(CatalogError::InvalidRange("missing start date".to_string())),
            (_, None) => Err(CatalogError::InvalidRange("missing end date".to_string())),
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.from > self.to {
            return Err(CatalogError::InvalidRange(format!(
                "start {} is after end {}",
                self.from.to_rfc3339(),
                self.to.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// An already committed booking window for one car. Both ends are occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationInterval {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl ReservationInterval {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self { start_date, end_date }
    }
}

impl From<&Reservation> for ReservationInterval {
    fn from(reservation: &Reservation) -> Self {
        Self::new(reservation.start_date, reservation.end_date)
    }
}

impl From<ReservationInterval> for DateRange {
    fn from(interval: ReservationInterval) -> Self {
        Self { from: interval.start_date, to: interval.end_date }
    }
}
