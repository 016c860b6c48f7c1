use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cars;
pub mod error;
pub mod middleware;
pub mod profile;
pub mod reservations;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // everything here requires a live session
    let protected = Router::new()
        .merge(auth::session_routes())
        .merge(reservations::routes())
        .merge(profile::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        .merge(auth::routes())
        .merge(cars::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
