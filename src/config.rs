use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use anyhow::{Context, Result};
use log::info;

/// Settings of the visit tracker, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub use_sqlite: bool,
    pub sqlite_path: PathBuf,
    pub db_host: String,
    pub db_port: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub bind_addr: String,
}

impl TrackerConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            use_sqlite: var("USE_SQLITE", "true").to_lowercase() == "true",
            sqlite_path: var("SQLITE_PATH", "visits.db").into(),
            db_host: var("DB_HOST", "localhost"),
            db_port: var("DB_PORT", "5432"),
            db_name: var("DB_NAME", "visits"),
            db_user: var("DB_USER", "postgres"),
            db_password: var("DB_PASSWORD", "postgres"),
            bind_addr: var("BIND_ADDR", "0.0.0.0:5000"),
        }
    }

    pub fn validate(self) -> Result<Self> {
        info!("--- Checking env variables ---");
        info!("🗄 Store: {}", if self.use_sqlite { "sqlite" } else { "postgres" });
        info!("🔗 Database URL: {}", self.redacted_database_url());
        info!("🌐 Bind address: {}", self.bind_addr);

        self.socket_addr()?;

        if !self.use_sqlite {
            self.db_port
                .parse::<u16>()
                .with_context(|| format!("DB_PORT is not a valid port: {:?}", self.db_port))?;
        }

        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("BIND_ADDR is not a socket address: {:?}", self.bind_addr))
    }

    pub fn database_url(&self) -> String {
        self.compose_url(&urlencoding::encode(&self.db_password))
    }

    pub fn redacted_database_url(&self) -> String {
        self.compose_url("***")
    }

    fn compose_url(&self, password: &str) -> String {
        if self.use_sqlite {
            format!("sqlite://{}", self.sqlite_path.to_string_lossy())
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                urlencoding::encode(&self.db_user),
                password,
                self.db_host,
                self.db_port,
                self.db_name
            )
        }
    }
}
