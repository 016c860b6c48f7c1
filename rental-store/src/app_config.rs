use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Booking backend and identity provider (same base URL).
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 { 10 }

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize { 100 }

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Where the client is sent after a forced sign-out.
    pub login_path: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `RENTAL__API__BASE_URL=https://api.example.com`
            .add_source(config::Environment::with_prefix("RENTAL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
