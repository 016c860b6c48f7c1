use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use rental_core::repository::{CarRepository, IdentityProvider, ReservationRepository, UserRepository};
use rental_order::ReservationPlanner;
use rental_store::app_config::{CacheConfig, SessionConfig};
use rental_store::QueryCache;

#[derive(Clone)]
pub struct SessionSettings {
    pub login_path: String,
}

#[derive(Clone)]
pub struct AppState {
    pub cars: Arc<dyn CarRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub cache: Arc<QueryCache>,
    pub planner: Arc<ReservationPlanner>,
    pub session: SessionSettings,
}

impl AppState {
    /// Wires one backend client into every repository seat and connects the
    /// planner's commit events to the cache. Must run inside a tokio runtime.
    pub fn from_backend<B>(backend: Arc<B>, cache: &CacheConfig, session: &SessionConfig) -> Self
    where
        B: CarRepository + ReservationRepository + UserRepository + IdentityProvider + 'static,
    {
        let query_cache = Arc::new(QueryCache::new(Duration::from_secs(cache.ttl_seconds)));
        let (events_tx, events_rx) = broadcast::channel(cache.channel_capacity);
        query_cache.spawn_invalidation_listener(events_rx);

        let planner = ReservationPlanner::new(backend.clone(), backend.clone(), events_tx);

        Self {
            cars: backend.clone(),
            reservations: backend.clone(),
            users: backend.clone(),
            identity: backend,
            cache: query_cache,
            planner: Arc::new(planner),
            session: SessionSettings {
                login_path: session.login_path.clone(),
            },
        }
    }
}
