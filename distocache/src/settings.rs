use crate::{info, CacheError};
use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;
use std::sync::Once;
use std::time::Duration;

static DOTENV_ONCE: Once = Once::new();

fn ensure_dotenv_loaded() {
    DOTENV_ONCE.call_once(|| {
        match dotenv() {
            Ok(_) => info!("Config loaded including .env file."),
            Err(_) => info!("Config loaded without .env file."),
        }
    });
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheSettings {
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoolSettings {
    pub max_size: usize,
    #[serde(deserialize_with = "duration_from_millis")]
    pub acquire_timeout_ms: Duration,
}

/// Where and how clients connect. A zero timeout means block indefinitely.
#[derive(Debug, Deserialize, Clone)]
pub struct TransportSettings {
    pub address: String,
    #[serde(deserialize_with = "duration_from_millis")]
    pub connect_timeout_ms: Duration,
    #[serde(deserialize_with = "duration_from_millis")]
    pub io_timeout_ms: Duration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self { max_size: 8, acquire_timeout_ms: Duration::from_secs(5) }
    }
}

impl PoolSettings {
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_size == 0 {
            return Err(ConfigError::Message("pool.max_size must be at least 1".to_string()).into());
        }
        Ok(())
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9091".to_string(),
            connect_timeout_ms: Duration::from_secs(3),
            io_timeout_ms: Duration::ZERO,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1:9091".to_string() }
    }
}

impl CacheSettings {
    pub fn new(path: &str) -> Result<Self, CacheError> {
        ensure_dotenv_loaded();
        let builder =
            Config::builder()
                .add_source(File::with_name(path).required(true))
                .add_source(Environment::with_prefix("DISTOCACHE").try_parsing(true).separator("__"));
        let settings: CacheSettings = builder.build()?.try_deserialize()?;
        settings.pool.validate()?;
        info!("{:#?}", settings);
        Ok(settings)
    }
}
