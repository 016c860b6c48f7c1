use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::{car::Car, user::User};

/// A committed booking as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car: Option<Box<Car>>,
}

/// Body of a reservation create (`id == None`) or update call.
///
/// `total_price` is computed on the client and is an estimate only: the
/// backend owns the authoritative price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub car_id: i64,
    pub user_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: f64,
}
