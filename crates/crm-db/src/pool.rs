//! Connection setup for the Postgres contacts store.
//!
//! Settings come from [`PoolConfig::from_env`]:
//! - `CRM_DB_MAX_CONNECTIONS`
//! - `CRM_DB_ACQUIRE_TIMEOUT_SECS`
//!
//! [`connect_store`] opens the pool, applies the `contacts` schema and hands
//! back a ready [`PgContactRepository`].

use std::env;
use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use crm_core::defaults::{DB_ACQUIRE_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use crm_core::{Error, Result};

use crate::contacts::PgContactRepository;
use crate::schema::ensure_schema;

/// Environment variable overriding [`PoolConfig::max_connections`].
pub const ENV_MAX_CONNECTIONS: &str = "CRM_DB_MAX_CONNECTIONS";

/// Environment variable overriding [`PoolConfig::acquire_timeout`], in seconds.
pub const ENV_ACQUIRE_TIMEOUT_SECS: &str = "CRM_DB_ACQUIRE_TIMEOUT_SECS";

/// Pool settings for the contacts store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a load or update waits for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Defaults overridden by the environment. Unparsable values and a
    /// zero pool size are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        match parse_env::<u32>(ENV_MAX_CONNECTIONS) {
            Some(0) => warn!(
                key = ENV_MAX_CONNECTIONS,
                "Pool size must be positive, keeping default"
            ),
            Some(n) => config.max_connections = n,
            None => {}
        }
        if let Some(secs) = parse_env::<u64>(ENV_ACQUIRE_TIMEOUT_SECS) {
            config.acquire_timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!(key, value = %raw, "Ignoring unparsable pool setting");
    }
    parsed
}

/// Open a pool against `database_url`.
pub async fn create_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        duration_ms = start.elapsed().as_millis() as u64,
        "Contacts store connected"
    );
    Ok(pool)
}

/// Connect, make sure the `contacts` table exists, and return the store.
pub async fn connect_store(database_url: &str, config: &PoolConfig) -> Result<PgContactRepository> {
    let pool = create_pool(database_url, config).await?;
    ensure_schema(&pool).await?;
    Ok(PgContactRepository::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_come_from_core() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DB_MAX_CONNECTIONS);
        assert_eq!(config.acquire_timeout, Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS));
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var(ENV_MAX_CONNECTIONS, "12");
        env::set_var(ENV_ACQUIRE_TIMEOUT_SECS, "1");

        let config = PoolConfig::from_env();
        assert_eq!(
            config,
            PoolConfig::new()
                .max_connections(12)
                .acquire_timeout(Duration::from_secs(1))
        );

        env::remove_var(ENV_MAX_CONNECTIONS);
        env::remove_var(ENV_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_env_ignores_zero_and_garbage() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var(ENV_MAX_CONNECTIONS, "0");
        env::set_var(ENV_ACQUIRE_TIMEOUT_SECS, "later");

        assert_eq!(PoolConfig::from_env(), PoolConfig::default());

        env::remove_var(ENV_MAX_CONNECTIONS);
        env::remove_var(ENV_ACQUIRE_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_connect_store_rejects_malformed_url() {
        let err = connect_store("not-a-url", &PoolConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Database(_)));
    }
}
