use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use rental_core::repository::{
    CarRepository, IdentityProvider, RepositoryError, RepositoryResult, ReservationRepository,
    UserRepository,
};
use rental_shared::{
    Car, CarListQuery, CarPage, Credentials, LoginResponse, Reservation, ReservationPayload, User,
};

use crate::app_config::ApiConfig;

/// JSON client for the booking backend and its `/auth/login` endpoint.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> RepositoryResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            warn!("{} failed: {}", what, e);
            RepositoryError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("{} -> {}", what, status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("{} rejected with {}: {}", what, status, body);
        Err(status_error(status, what, body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> RepositoryResult<T> {
        self.send(request, what)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::Decode(format!("{}: {}", what, e)))
    }
}

/// Maps a non-success status to the matching error kind.
pub(crate) fn status_error(status: StatusCode, what: &str, body: String) -> RepositoryError {
    match status {
        StatusCode::NOT_FOUND => RepositoryError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepositoryError::Unauthorized(what.to_string()),
        _ => RepositoryError::Rejected {
            status: status.as_u16(),
            message: if body.is_empty() { what.to_string() } else { body },
        },
    }
}

#[async_trait]
impl CarRepository for RestClient {
    async fn list_cars(&self, query: &CarListQuery) -> RepositoryResult<CarPage> {
        let request = self.http.get(self.url("/car")).query(&query.to_query_pairs());
        self.fetch(request, "GET /car").await
    }

    async fn get_car(&self, id: i64) -> RepositoryResult<Car> {
        let path = format!("/car/{}", id);
        self.fetch(self.http.get(self.url(&path)), &format!("GET {}", path)).await
    }
}

#[async_trait]
impl ReservationRepository for RestClient {
    async fn list_by_car(&self, car_id: i64) -> RepositoryResult<Vec<Reservation>> {
        let path = format!("/reservation/car/{}", car_id);
        self.fetch(self.http.get(self.url(&path)), &format!("GET {}", path)).await
    }

    async fn list_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Reservation>> {
        let path = format!("/reservation/user/{}", user_id);
        self.fetch(self.http.get(self.url(&path)), &format!("GET {}", path)).await
    }

    async fn get_reservation(&self, id: i64) -> RepositoryResult<Reservation> {
        let path = format!("/reservation/{}", id);
        self.fetch(self.http.get(self.url(&path)), &format!("GET {}", path)).await
    }

    async fn create_reservation(&self, payload: &ReservationPayload) -> RepositoryResult<()> {
        let request = self.http.post(self.url("/reservation")).json(payload);
        self.send(request, "POST /reservation").await?;
        Ok(())
    }

    async fn update_reservation(
        &self,
        id: i64,
        payload: &ReservationPayload,
    ) -> RepositoryResult<Reservation> {
        let path = format!("/reservation/{}", id);
        let request = self.http.put(self.url(&path)).json(payload);
        self.fetch(request, &format!("PUT {}", path)).await
    }
}

#[async_trait]
impl UserRepository for RestClient {
    async fn get_user(&self, id: i64) -> RepositoryResult<User> {
        let path = format!("/user/{}", id);
        self.fetch(self.http.get(self.url(&path)), &format!("GET {}", path)).await
    }
}

#[async_trait]
impl IdentityProvider for RestClient {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<String> {
        let request = self.http.post(self.url("/auth/login")).json(credentials);
        let response: LoginResponse = self.fetch(request, "POST /auth/login").await?;
        Ok(response.access_token.into_inner())
    }
}
