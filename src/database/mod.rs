use crate::config::DatabaseConfig;
use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite};
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod channels;
pub mod reports;

/// Schema statements applied in order on startup. Every statement is
/// idempotent, so migrate() can run on every boot.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS channels (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        site TEXT NOT NULL,
        lang TEXT NOT NULL,
        xmltv_id TEXT NOT NULL,
        site_id TEXT,
        name TEXT NOT NULL,
        country TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_site ON channels(site)",
    "CREATE INDEX IF NOT EXISTS idx_lang ON channels(lang)",
    "CREATE INDEX IF NOT EXISTS idx_country ON channels(country)",
    "CREATE INDEX IF NOT EXISTS idx_name ON channels(name)",
    "CREATE INDEX IF NOT EXISTS idx_xmltv_id ON channels(xmltv_id)",
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        channel_id INTEGER,
        xmltv_id TEXT,
        channel_name TEXT,
        site TEXT,
        reason TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    refresh_lock: Arc<Mutex<()>>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // Create database file if it doesn't exist (for SQLite)
        if !config.url.contains(":memory:") {
            if let Some(path) = config.url.strip_prefix("sqlite://") {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
            }
            if !Sqlite::database_exists(&config.url).await? {
                Sqlite::create_database(&config.url).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(10))
            .connect(&config.url)
            .await?;

        Ok(Self {
            pool,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Serializes refresh cycles. The ingestor holds this guard across the
    /// whole fetch-and-replace, so concurrent refresh requests queue up
    /// instead of interleaving.
    pub async fn acquire_refresh_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }
}
