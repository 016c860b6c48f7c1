pub mod app_config;
pub mod api_client;
pub mod query_cache;

pub use api_client::RestClient;
pub use query_cache::{EntityKind, QueryCache, QueryKey};
