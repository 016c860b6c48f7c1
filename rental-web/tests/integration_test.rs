use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use rental_core::repository::{
    CarRepository, IdentityProvider, RepositoryError, RepositoryResult, ReservationRepository,
    UserRepository,
};
use rental_shared::{
    Car, CarListQuery, CarPage, Credentials, Reservation, ReservationPayload, User,
};
use rental_store::app_config::{CacheConfig, SessionConfig};
use rental_store::QueryKey;
use rental_web::{app, AppState};

const USER_ID: i64 = 42;

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap()
}

fn onix() -> Car {
    Car {
        id: 7,
        name: "Onix".to_string(),
        plate: "ABC1D23".to_string(),
        brand: "Chevrolet".to_string(),
        year: 2022,
        price: 100.0,
        image_url: "https://img.example/onix.png".to_string(),
        reservations: None,
    }
}

fn reservation(id: i64, user_id: i64, from: u32, to: u32) -> Reservation {
    Reservation {
        id,
        user_id,
        car_id: 7,
        start_date: day(from),
        end_date: day(to),
        total_price: 400.0,
        user: None,
        car: None,
    }
}

fn token(exp: i64) -> String {
    let claims = json!({ "sub": USER_ID.to_string(), "username": "ana", "iat": exp - 3600, "exp": exp });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
}

fn live_token() -> String {
    token(Utc::now().timestamp() + 3600)
}

/// In-memory booking backend: car 7 is reserved Jan 5-8 by user 3 (reservation 11)
/// and Jan 20-22 by the signed-in user (reservation 12).
struct MockBackend {
    reservations: Vec<Reservation>,
    created: Mutex<Vec<ReservationPayload>>,
    updated: Mutex<Vec<(i64, ReservationPayload)>>,
    list_calls: AtomicUsize,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            reservations: vec![reservation(11, 3, 5, 8), reservation(12, USER_ID, 20, 22)],
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CarRepository for MockBackend {
    async fn list_cars(&self, _query: &CarListQuery) -> RepositoryResult<CarPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CarPage { data: vec![onix()], total: 1 })
    }

    async fn get_car(&self, id: i64) -> RepositoryResult<Car> {
        if id == 7 {
            Ok(onix())
        } else {
            Err(RepositoryError::NotFound(format!("GET /car/{}", id)))
        }
    }
}

#[async_trait]
impl ReservationRepository for MockBackend {
    async fn list_by_car(&self, car_id: i64) -> RepositoryResult<Vec<Reservation>> {
        Ok(self.reservations.iter().filter(|r| r.car_id == car_id).cloned().collect())
    }

    async fn list_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Reservation>> {
        Ok(self.reservations.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn get_reservation(&self, id: i64) -> RepositoryResult<Reservation> {
        self.reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("GET /reservation/{}", id)))
    }

    async fn create_reservation(&self, payload: &ReservationPayload) -> RepositoryResult<()> {
        self.created.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn update_reservation(&self, id: i64, payload: &ReservationPayload) -> RepositoryResult<Reservation> {
        self.updated.lock().unwrap().push((id, payload.clone()));
        Ok(Reservation {
            id,
            user_id: payload.user_id,
            car_id: payload.car_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            total_price: payload.total_price,
            user: None,
            car: None,
        })
    }
}

#[async_trait]
impl UserRepository for MockBackend {
    async fn get_user(&self, id: i64) -> RepositoryResult<User> {
        Ok(User {
            id,
            name: "Ana".to_string(),
            email: "ana@rental.dev".to_string(),
            reservations: None,
        })
    }
}

#[async_trait]
impl IdentityProvider for MockBackend {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<String> {
        if credentials.email == "ana@rental.dev" && credentials.password.expose() == "secret" {
            Ok(live_token())
        } else {
            Err(RepositoryError::Unauthorized("POST /auth/login".to_string()))
        }
    }
}

fn setup() -> (Router, AppState, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend::new());
    let state = AppState::from_backend(
        backend.clone(),
        &CacheConfig { ttl_seconds: 60, channel_capacity: 16 },
        &SessionConfig { login_path: "/login".to_string() },
    );
    (app(state.clone()), state, backend)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn test_quote_counts_both_boundary_days() {
    let (app, _, _) = setup();
    let (status, body) = call(
        &app,
        Method::GET,
        "/cars/7/quote?from=2025-01-01T00:00:00Z&to=2025-01-03T00:00:00Z",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 3);
    assert_eq!(body["totalPrice"], 300.0);
}

#[tokio::test]
async fn test_quote_rejects_inverted_and_missing_dates() {
    let (app, _, _) = setup();
    let (status, _) = call(
        &app,
        Method::GET,
        "/cars/7/quote?from=2025-01-03T00:00:00Z&to=2025-01-01T00:00:00Z",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::GET, "/cars/7/quote?from=2025-01-03T00:00:00Z", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_treats_touching_boundary_as_conflict() {
    let (app, _, _) = setup();
    let (status, body) = call(
        &app,
        Method::GET,
        "/cars/7/availability?from=2025-01-08T00:00:00Z&to=2025-01-10T00:00:00Z",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);
    assert_eq!(body["blockedRanges"].as_array().unwrap().len(), 2);

    let (_, body) = call(
        &app,
        Method::GET,
        "/cars/7/availability?from=2025-01-09T00:00:00Z&to=2025-01-10T00:00:00Z",
        None,
        None,
    )
    .await;
    assert_eq!(body["available"], true);
    assert_eq!(body["quote"]["totalPrice"], 200.0);
}

#[tokio::test]
async fn test_availability_ignores_reservation_being_edited() {
    let (app, _, _) = setup();
    let (_, body) = call(
        &app,
        Method::GET,
        "/cars/7/availability?from=2025-01-21T00:00:00Z&to=2025-01-23T00:00:00Z&reservationId=12",
        None,
        None,
    )
    .await;
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn test_unknown_car_is_not_found() {
    let (app, _, _) = setup();
    let (status, _) = call(&app, Method::GET, "/cars/99", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token_forces_sign_out() {
    let (app, _, _) = setup();
    let (status, body) = call(&app, Method::GET, "/profile", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["signOut"], true);
    assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn test_expired_token_forces_sign_out() {
    let (app, _, _) = setup();
    let expired = token(Utc::now().timestamp() - 1);
    let (status, body) = call(&app, Method::GET, "/session", Some(&expired), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["signOut"], true);
    assert_eq!(body["error"], "Session expired");
}

#[tokio::test]
async fn test_malformed_token_forces_sign_out() {
    let (app, _, _) = setup();
    let (status, body) = call(&app, Method::GET, "/session", Some("not-a-jwt"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["signOut"], true);
}

#[tokio::test]
async fn test_live_session_is_reported() {
    let (app, _, _) = setup();
    let token = live_token();
    let (status, body) = call(&app, Method::GET, "/session", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "42");
    assert_eq!(body["username"], "ana");
    assert_eq!(body["isExpired"], false);
}

#[tokio::test]
async fn test_login() {
    let (app, _, _) = setup();

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ana@rental.dev", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "42");
    assert_eq!(body["email"], "ana@rental.dev");
    assert!(body["accessToken"].as_str().unwrap().contains('.'));

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ana@rental.dev", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("signOut").is_none());
}

#[tokio::test]
async fn test_create_reservation_sends_priced_payload() {
    let (app, _, backend) = setup();
    let token = live_token();
    let (status, body) = call(
        &app,
        Method::POST,
        "/reservations",
        Some(&token),
        Some(json!({ "carId": 7, "startDate": "2025-01-01T00:00:00Z", "endDate": "2025-01-03T00:00:00Z" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "CREATED");
    assert_eq!(body["quote"]["totalPrice"], 300.0);

    let created = backend.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, None);
    assert_eq!(created[0].user_id, USER_ID);
    assert_eq!(created[0].total_price, 300.0);
}

#[tokio::test]
async fn test_conflicting_reservation_is_rejected_without_write() {
    let (app, _, backend) = setup();
    let token = live_token();
    let (status, body) = call(
        &app,
        Method::POST,
        "/reservations",
        Some(&token),
        Some(json!({ "carId": 7, "startDate": "2025-01-08T00:00:00Z", "endDate": "2025-01-10T00:00:00Z" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);
    assert!(backend.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_own_reservation() {
    let (app, _, backend) = setup();
    let token = live_token();
    let (status, body) = call(
        &app,
        Method::PUT,
        "/reservations/12",
        Some(&token),
        Some(json!({ "carId": 7, "startDate": "2025-01-21T00:00:00Z", "endDate": "2025-01-24T00:00:00Z" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "UPDATED");
    assert_eq!(body["reservation"]["id"], 12);

    let updated = backend.updated.lock().unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0, 12);
    assert_eq!(updated[0].1.id, Some(12));
    assert_eq!(updated[0].1.total_price, 400.0);
}

#[tokio::test]
async fn test_other_users_reservation_is_forbidden() {
    let (app, _, backend) = setup();
    let token = live_token();

    let (status, _) = call(&app, Method::GET, "/reservations/11", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/reservations/11",
        Some(&token),
        Some(json!({ "carId": 7, "startDate": "2025-01-05T00:00:00Z", "endDate": "2025-01-06T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(backend.updated.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_lists_own_reservations() {
    let (app, _, _) = setup();
    let token = live_token();
    let (status, body) = call(&app, Method::GET, "/profile", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], USER_ID);
    let reservations = body["reservations"].as_array().unwrap();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0]["id"], 12);
}

#[tokio::test]
async fn test_commit_invalidates_cached_listing() {
    let (app, state, backend) = setup();
    let token = live_token();
    let listing = QueryKey::car_listing(&CarListQuery::default());

    call(&app, Method::GET, "/cars", None, None).await;
    call(&app, Method::GET, "/cars", None, None).await;
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
    assert!(state.cache.get::<CarPage>(&listing).await.is_some());

    let (status, _) = call(
        &app,
        Method::POST,
        "/reservations",
        Some(&token),
        Some(json!({ "carId": 7, "startDate": "2025-01-01T00:00:00Z", "endDate": "2025-01-02T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // dropped before the 201 is returned, no waiting on the listener
    assert!(state.cache.get::<CarPage>(&listing).await.is_none());

    call(&app, Method::GET, "/cars", None, None).await;
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
}
