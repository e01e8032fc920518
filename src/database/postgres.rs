//! Record store backed by the platform's managed Postgres.
//!
//! Expects the tables provisioned by the platform project:
//!
//! ```sql
//! products (id uuid primary key default gen_random_uuid(), name text not null,
//!           description text, price numeric not null check (price > 0),
//!           image_url text, user_id uuid not null,
//!           created_at timestamptz not null default now())
//! profiles (id uuid primary key, display_name text)
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{NewProduct, Product, ProductListing, ProductPatch, ProductQuery, Profile};
use super::{ProductStore, ProfileStore, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, user_id, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn query(&self, query: &ProductQuery) -> Result<Vec<ProductListing>, StoreError> {
        let rows = sqlx::query_as::<_, ProductListing>(
            r#"
            SELECT p.id, p.name, p.description, p.price, p.image_url, p.user_id, p.created_at,
                   pr.display_name AS owner_display_name
            FROM products p
            LEFT JOIN profiles pr ON pr.id = p.user_id
            WHERE ($1::uuid IS NULL OR p.user_id = $1)
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO products (name, description, price, image_url, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(product.name)
            .bind(product.description)
            .bind(product.price)
            .bind(product.image_url)
            .bind(product.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, StoreError> {
        if patch.is_empty() {
            return self.find(id).await?.ok_or(StoreError::NotFound);
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE products SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(name) = patch.name {
                set.push("name = ").push_bind_unseparated(name);
            }
            if let Some(description) = patch.description {
                set.push("description = ").push_bind_unseparated(description);
            }
            if let Some(price) = patch.price {
                set.push("price = ").push_bind_unseparated(price);
            }
            if let Some(image_url) = patch.image_url {
                set.push("image_url = ").push_bind_unseparated(image_url);
            }
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PRODUCT_COLUMNS);

        builder
            .build_query_as::<Product>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, Profile>("SELECT id, display_name FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn set_display_name(&self, user_id: Uuid, display_name: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO profiles (id, display_name) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET display_name = EXCLUDED.display_name",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
