use async_trait::async_trait;

use rental_shared::{Car, CarListQuery, CarPage, Credentials, Reservation, ReservationPayload, User};

/// Failures talking to the booking backend or the identity provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Car catalogue endpoints
#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn list_cars(&self, query: &CarListQuery) -> RepositoryResult<CarPage>;

    async fn get_car(&self, id: i64) -> RepositoryResult<Car>;
}

/// Reservation endpoints
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn list_by_car(&self, car_id: i64) -> RepositoryResult<Vec<Reservation>>;

    async fn list_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Reservation>>;

    async fn get_reservation(&self, id: i64) -> RepositoryResult<Reservation>;

    async fn create_reservation(&self, payload: &ReservationPayload) -> RepositoryResult<()>;

    async fn update_reservation(
        &self,
        id: i64,
        payload: &ReservationPayload,
    ) -> RepositoryResult<Reservation>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: i64) -> RepositoryResult<User>;
}

/// Exchanges credentials for a bearer token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<String>;
}
