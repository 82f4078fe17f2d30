//! Pooled SQL access shared by the store and the migration runner
//!
//! Queries are written once with `?` bind markers. [`StorePool::sql`] rewrites
//! them for the backend the pool was opened against.

use std::fmt;
use std::time::Duration;

use sqlx::{any::AnyPoolOptions, AnyPool};

use crate::persistence::error::PersistenceError;
use crate::persistence::PersistenceConfig;

/// SQL dialect behind a store URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// `sqlite:` URLs, including `sqlite::memory:`
    Sqlite,
    /// `postgres:` and `postgresql:` URLs
    Postgres,
    /// `mysql:` and `mariadb:` URLs
    Mysql,
}

impl DatabaseBackend {
    /// Pick the dialect from the URL scheme
    pub fn from_url(url: &str) -> Result<Self, PersistenceError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            other => Err(PersistenceError::UnsupportedBackend(other.to_string())),
        }
    }

    /// Rewrite `?` bind markers into this backend's placeholder syntax
    pub fn sql(&self, query: &str) -> String {
        match self {
            Self::Postgres => {
                let mut out = String::with_capacity(query.len() + 8);
                let mut n = 0;
                for ch in query.chars() {
                    if ch == '?' {
                        n += 1;
                        out.push('$');
                        out.push_str(&n.to_string());
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
            Self::Sqlite | Self::Mysql => query.to_string(),
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "SQLite",
            Self::Postgres => "PostgreSQL",
            Self::Mysql => "MySQL",
        })
    }
}

/// Cloneable handle on the store's connection pool
#[derive(Clone)]
pub struct StorePool {
    pool: AnyPool,
    backend: DatabaseBackend,
}

impl StorePool {
    /// Open a pool sized and timed by the persistence settings
    ///
    /// An in-memory SQLite URL gives each connection its own database, so
    /// such stores should be opened with `max_connections = 1`.
    pub async fn open(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        sqlx::any::install_default_drivers();
        let backend = DatabaseBackend::from_url(&config.url)?;

        tracing::info!(
            backend = %backend,
            max_connections = config.max_connections,
            "Opening form store pool"
        );

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| PersistenceError::Connection(format!("{} store: {}", backend, e)))?;

        Ok(Self { pool, backend })
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub fn inner(&self) -> &AnyPool {
        &self.pool
    }

    pub fn sql(&self, query: &str) -> String {
        self.backend.sql(query)
    }
}
