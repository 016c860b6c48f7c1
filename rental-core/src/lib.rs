pub mod session;
pub mod repository;

pub use session::{
    evaluate_session, is_session_expired, is_session_expired_now, peek_unverified_claims,
    SessionError, SessionStatus, UnverifiedClaims,
};
pub use repository::{
    CarRepository, IdentityProvider, RepositoryError, RepositoryResult, ReservationRepository,
    UserRepository,
};
