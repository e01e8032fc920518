use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from pool creation
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open a connection pool against the platform's Postgres.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let raw = config
        .url
        .as_deref()
        .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
    let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url.as_str())
        .await?;

    info!("Created database pool for: {}", redacted(&url));
    Ok(pool)
}

/// Host and database path only, never credentials.
fn redacted(url: &url::Url) -> String {
    format!("{}{}", url.host_str().unwrap_or("localhost"), url.path())
}
