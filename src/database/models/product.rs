use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A catalog row as stored. `user_id` is fixed at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Product joined with its owner's display name, as returned by listings.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    pub product: Product,
    pub owner_display_name: Option<String>,
}

/// Filter for collection queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Exact match on the owning account.
    pub user_id: Option<Uuid>,
}

/// Validated insert payload. The owner always comes from the requester.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub user_id: Uuid,
}

/// Validated partial update. `None` leaves a column untouched; for the
/// nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub image_url: Option<Option<String>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
    }

    /// Apply the patch to an in-memory row.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pen() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Pen".into(),
            description: Some("blue".into()),
            price: Decimal::new(15, 1),
            image_url: None,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn price_serializes_as_number() {
        let value = serde_json::to_value(pen()).unwrap();
        assert_eq!(value["price"], json!(1.5));
    }

    #[test]
    fn patch_clears_and_keeps_fields() {
        let mut product = pen();
        let owner = product.user_id;
        ProductPatch {
            name: Some("Pencil".into()),
            description: Some(None),
            ..Default::default()
        }
        .apply_to(&mut product);

        assert_eq!(product.name, "Pencil");
        assert_eq!(product.description, None);
        assert_eq!(product.price, Decimal::new(15, 1));
        assert_eq!(product.user_id, owner);
    }

    #[test]
    fn empty_patch() {
        assert!(ProductPatch::default().is_empty());
        assert!(!ProductPatch { price: Some(Decimal::ONE), ..Default::default() }.is_empty());
    }
}
