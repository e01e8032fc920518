pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use manager::DatabaseError;
pub use memory::MemoryStore;
pub use models::{NewProduct, Product, ProductListing, ProductPatch, ProductQuery, Profile};
pub use postgres::PgStore;

/// Errors raised by the record store. Messages are passed to clients as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// The store refused the operation (constraint, type or syntax failure).
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Persistence for product rows.
///
/// Implementations own ID generation and `created_at`; callers never supply either.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Rows matching `query`, newest first (`created_at DESC, id DESC`).
    async fn query(&self, query: &ProductQuery) -> Result<Vec<ProductListing>, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Returns `StoreError::NotFound` when the row no longer exists.
    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Connectivity check used by `/health`.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Persistence for per-account profile data.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Creates the profile row if the account has none yet.
    async fn set_display_name(&self, user_id: Uuid, display_name: &str) -> Result<(), StoreError>;
}
