pub mod models;
pub mod planner;

pub use models::{
    Availability, BookingContext, BookingMode, ReservationPlan, ReservationRequest, SubmitOutcome,
};
pub use planner::{plan_against, BookingError, ReservationPlanner};
