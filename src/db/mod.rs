use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result};
use log::info;

use crate::config::TrackerConfig;

pub mod models;
pub mod visits;

pub use models::Visit;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ip_address VARCHAR(50) NOT NULL DEFAULT '',
    timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    user_agent VARCHAR(200) NOT NULL DEFAULT 'Unknown'
)
"#;

const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS visits (
    id BIGSERIAL PRIMARY KEY,
    ip_address VARCHAR(50) NOT NULL DEFAULT '',
    timestamp TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
    user_agent VARCHAR(200) NOT NULL DEFAULT 'Unknown'
)
"#;

/// Handle to whichever relational store was selected at startup.
#[derive(Clone, Debug)]
pub enum Store {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// Opens a lazily connecting pool, so the service comes up even while the
/// database server is unreachable.
pub async fn connect(config: &TrackerConfig) -> Result<Store> {
    let db_url = config.database_url();

    if config.use_sqlite {
        prepare_db_dir(&config.sqlite_path).context("Error preparing db dir")?;

        let opts = SqliteConnectOptions::from_str(&db_url)
            .context("Unsupported sqlite database URL")?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(opts);

        Ok(Store::Sqlite(pool))
    } else {
        let opts = PgConnectOptions::from_str(&db_url)
            .with_context(|| format!("Unsupported postgres URL {}", config.redacted_database_url()))?;

        let pool = PgPoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(opts);

        Ok(Store::Postgres(pool))
    }
}

fn prepare_db_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Create DB folder: {:?}", parent);
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Fail create dir {:?}", parent))?;
        }
    }

    Ok(())
}

impl Store {
    /// Creates the `visits` table when it does not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        let created = match self {
            Store::Sqlite(pool) => sqlx::query(SQLITE_SCHEMA).execute(pool).await.map(|_| ()),
            Store::Postgres(pool) => sqlx::query(POSTGRES_SCHEMA).execute(pool).await.map(|_| ()),
        };

        created.context("Error creating visits table")
    }

    /// Trivial round trip used by the health check.
    pub async fn probe(&self) -> Result<()> {
        let probed = match self {
            Store::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Store::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        };

        Ok(probed?)
    }

    pub async fn close(&self) {
        match self {
            Store::Sqlite(pool) => pool.close().await,
            Store::Postgres(pool) => pool.close().await,
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Sqlite(_) => "sqlite",
            Store::Postgres(_) => "postgres",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Single-connection in-memory database, kept alive for the whole test.
    pub(crate) async fn memory_store() -> Store {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory sqlite");

        Store::Sqlite(pool)
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() -> Result<()> {
        let store = memory_store().await;

        store.init_schema().await?;
        store.init_schema().await?;

        let tables: i64 = match &store {
            Store::Sqlite(pool) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'visits'")
                    .fetch_one(pool)
                    .await?
            }
            Store::Postgres(_) => unreachable!(),
        };
        assert_eq!(tables, 1);
        Ok(())
    }

    #[tokio::test]
    async fn probe_fails_once_pool_is_closed() {
        let store = memory_store().await;
        assert!(store.probe().await.is_ok());

        store.close().await;
        assert!(store.probe().await.is_err());
    }

    #[tokio::test]
    async fn connect_creates_sqlite_file_and_parent_dir() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("visit-tracker-{}", std::process::id()));
        let path = dir.join("nested").join("visits.db");
        let config = TrackerConfig::from_lookup(|key| match key {
            "SQLITE_PATH" => Some(path.to_string_lossy().into_owned()),
            _ => None,
        });

        let store = connect(&config).await?;
        assert_eq!(store.backend(), "sqlite");
        store.init_schema().await?;
        store.probe().await?;
        store.close().await;

        assert!(path.exists());
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[tokio::test]
    async fn postgres_store_is_created_lazily() -> Result<()> {
        let config = TrackerConfig::from_lookup(|key| match key {
            "USE_SQLITE" => Some("false".to_string()),
            "DB_HOST" => Some("127.0.0.1".to_string()),
            "DB_PORT" => Some("1".to_string()),
            _ => None,
        });

        let store = connect(&config).await?;
        assert_eq!(store.backend(), "postgres");
        assert!(store.probe().await.is_err());
        Ok(())
    }
}
