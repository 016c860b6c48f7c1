use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitKind {
    Created,
    Updated,
}

/// Published after the backend accepted a reservation create/update.
/// Listeners use it to drop cached listings for the car and the user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReservationCommittedEvent {
    pub reservation_id: Option<i64>,
    pub car_id: i64,
    pub user_id: i64,
    pub kind: CommitKind,
    pub total_price: f64,
    pub timestamp: i64,
}
