pub mod models;
pub mod pii;

pub use models::auth::{Credentials, LoginResponse};
pub use models::car::{Car, CarListQuery, CarPage};
pub use models::events::{CommitKind, ReservationCommittedEvent};
pub use models::reservation::{Reservation, ReservationPayload};
pub use models::user::User;
pub use pii::Masked;
