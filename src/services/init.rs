//! Initialization helpers shared by the binaries:
//! - tracing subscriber
//! - database connection + migrations
//! - application state assembly

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, DatabaseConfig};
use crate::crypto::CredentialCipher;
use crate::AppState;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tour_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Redact potentially sensitive information from a database URL before logging.
///
/// Attempts to parse the URL and remove userinfo (username:password) components.
/// Falls back to removing everything before '@' or returning "(redacted)".
pub fn redact_db_url(db_url: &str) -> String {
    if let Ok(url) = url::Url::parse(db_url) {
        let scheme = url.scheme();
        let host = url.host_str().unwrap_or("");
        let port_part = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = url.path();
        format!("{}://{}{}{}", scheme, host, port_part, path)
    } else {
        if let Some(at_pos) = db_url.find('@') {
            let without_creds = &db_url[at_pos + 1..];
            return format!("(redacted){}", without_creds);
        }
        "(redacted)".to_string()
    }
}

/// Open the SQLite pool and run migrations.
///
/// File databases get their parent directory created first.
pub async fn init_db(database: &DatabaseConfig) -> Result<sqlx::SqlitePool> {
    let db_url = &database.url;
    tracing::info!("Connecting to database: {}", redact_db_url(db_url));

    let connect_options = if db_url.contains(":memory:") {
        // Named shared-cache database, visible to every pooled connection.
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else {
        let db_path = db_url.strip_prefix("sqlite://").unwrap_or(db_url);
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    )
                })?;
            }
        }
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
    };

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(database.max_connections)
        .connect_with(connect_options.foreign_keys(true))
        .await?;

    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Connect, migrate and build the cipher for sender credentials.
pub async fn init_state(config: Config) -> Result<AppState> {
    let cipher = CredentialCipher::from_hex_key(&config.sender.encryption_key)?;
    let db = init_db(&config.database).await?;
    Ok(AppState { db, config, cipher })
}
