//! In-process cache for backend reads.
//!
//! Entries are keyed by entity kind, optional id and query parameters, and
//! hold the JSON form of the fetched value. Invalidation is driven by
//! `ReservationCommittedEvent`s received on a broadcast channel, so writers
//! never reach into the cache directly.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use rental_shared::{CarListQuery, ReservationCommittedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    CarListing,
    Car,
    CarReservations,
    UserReservations,
    Reservation,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::CarListing => "cars",
            EntityKind::Car => "car",
            EntityKind::CarReservations => "car_reservations",
            EntityKind::UserReservations => "user_reservations",
            EntityKind::Reservation => "reservation",
            EntityKind::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub entity: EntityKind,
    pub id: Option<i64>,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(entity: EntityKind) -> Self {
        Self { entity, id: None, params: BTreeMap::new() }
    }

    pub fn with_id(entity: EntityKind, id: i64) -> Self {
        Self { entity, id: Some(id), params: BTreeMap::new() }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn car_listing(query: &CarListQuery) -> Self {
        query
            .to_query_pairs()
            .into_iter()
            .fold(Self::new(EntityKind::CarListing), |key, (k, v)| key.param(k, v))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity.as_str())?;
        if let Some(id) = self.id {
            write!(f, ":{}", id)?;
        }
        for (i, (k, v)) in self.params.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { '?' } else { '&' }, k, v)?;
        }
        Ok(())
    }
}

struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    ttl: Duration,
    /// Bumped under the write lock by every invalidation. A fetch that
    /// overlapped one is returned to its caller but not stored.
    generation: AtomicU64,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Fresh cached value for `key`, if any. An expired entry is evicted.
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        {
            let entries = self.entries.read().await;
            let entry = entries.get(key)?;
            if entry.is_fresh(self.ttl) {
                return serde_json::from_value(entry.value.clone()).ok();
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_fresh(self.ttl)) {
            entries.remove(key);
        }
        None
    }

    pub async fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        self.store(key, value, None).await;
    }

    /// Inserts `value`, sweeping expired entries first. With `since`, the
    /// value is dropped if an invalidation happened after that generation.
    async fn store<T: Serialize>(&self, key: QueryKey, value: &T, since: Option<u64>) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Not caching {}: {}", key, e);
                return;
            }
        };

        let mut entries = self.entries.write().await;
        if since.is_some_and(|g| g != self.generation.load(Ordering::Acquire)) {
            debug!("not caching {}: invalidated during fetch", key);
            return;
        }

        let ttl = self.ttl;
        entries.retain(|_, entry| entry.is_fresh(ttl));
        entries.insert(key, CacheEntry { value, stored_at: Instant::now() });
    }

    /// Serves `key` from the cache or runs `fetch` and stores its result.
    /// Errors are returned as-is and never cached, and neither is a result
    /// whose fetch overlapped an invalidation.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            debug!("cache hit {}", key);
            return Ok(hit);
        }

        debug!("cache miss {}", key);
        let generation = self.generation.load(Ordering::Acquire);
        let value = fetch().await?;
        self.store(key, &value, Some(generation)).await;
        Ok(value)
    }

    pub async fn clear(&self) -> usize {
        self.invalidate_where(|_| true).await
    }

    async fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops what a committed reservation makes stale: every car listing
    /// (availability filters), the car itself, both reservation lists and
    /// the reservation entry.
    pub async fn apply(&self, event: &ReservationCommittedEvent) -> usize {
        let car_id = Some(event.car_id);
        let user_id = Some(event.user_id);
        let removed = self
            .invalidate_where(|key| match key.entity {
                EntityKind::CarListing => true,
                EntityKind::Car | EntityKind::CarReservations => key.id == car_id,
                EntityKind::UserReservations | EntityKind::User => key.id == user_id,
                EntityKind::Reservation => event.reservation_id.is_some() && key.id == event.reservation_id,
            })
            .await;

        info!(
            "Invalidated {} cache entries after reservation commit (car {}, user {})",
            removed, event.car_id, event.user_id
        );
        removed
    }

    /// Applies every event received on `rx` until the sender side closes.
    pub fn spawn_invalidation_listener(
        self: &Arc<Self>,
        mut rx: broadcast::Receiver<ReservationCommittedEvent>,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        cache.apply(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Cache listener lagged by {} events, clearing cache", skipped);
                        cache.clear().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
