pub mod auth;
pub mod car;
pub mod events;
pub mod reservation;
pub mod user;
