use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{NewProduct, Product, ProductListing, ProductPatch, ProductQuery, Profile};
use super::{ProductStore, ProfileStore, StoreError};

/// Process-local record store for development and tests.
///
/// Mirrors the constraints of the Postgres tables that matter to callers:
/// generated ids, server-side `created_at`, and a positive price.
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<Uuid, Product>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

fn check_price(price: Decimal) -> Result<(), StoreError> {
    if price <= Decimal::ZERO {
        return Err(StoreError::Rejected(
            "new row for relation \"products\" violates check constraint \"products_price_check\"".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn query(&self, query: &ProductQuery) -> Result<Vec<ProductListing>, StoreError> {
        let products = self.products.read().await;
        let profiles = self.profiles.read().await;

        let mut rows: Vec<ProductListing> = products
            .values()
            .filter(|p| query.user_id.map_or(true, |owner| p.user_id == owner))
            .map(|p| ProductListing {
                product: p.clone(),
                owner_display_name: profiles.get(&p.user_id).and_then(|pr| pr.display_name.clone()),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.product
                .created_at
                .cmp(&a.product.created_at)
                .then_with(|| b.product.id.cmp(&a.product.id))
        });
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        check_price(product.price)?;

        let row = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            user_id: product.user_id,
            created_at: Utc::now(),
        };
        self.products.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, StoreError> {
        if let Some(price) = patch.price {
            check_price(price)?;
        }

        let mut products = self.products.write().await;
        let row = products.get_mut(&id).ok_or(StoreError::NotFound)?;
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn set_display_name(&self, user_id: Uuid, display_name: &str) -> Result<(), StoreError> {
        self.profiles.write().await.insert(
            user_id,
            Profile {
                id: user_id,
                display_name: Some(display_name.to_string()),
            },
        );
        Ok(())
    }
}
