use serde::Serialize;

use crate::auth::UserIdentity;
use crate::database::{Product, ProductListing};

/// A product as seen by a particular requester.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub is_owner: bool,
    /// Owner profile summary; present on listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<OwnerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerSummary {
    pub display_name: Option<String>,
}

impl ProductView {
    pub fn for_viewer(product: Product, viewer: &UserIdentity) -> Self {
        Self {
            is_owner: viewer.owns(&product),
            product,
            profiles: None,
        }
    }

    pub fn from_listing(listing: ProductListing, viewer: &UserIdentity) -> Self {
        Self {
            profiles: Some(OwnerSummary {
                display_name: listing.owner_display_name,
            }),
            ..Self::for_viewer(listing.product, viewer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserProfile;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;

    fn viewer() -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            profile: UserProfile::default(),
        }
    }

    fn product(owner: Uuid) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Pen".into(),
            description: None,
            price: Decimal::new(15, 1),
            image_url: None,
            user_id: owner,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn flattens_row_and_marks_ownership() {
        let me = viewer();
        let mine = serde_json::to_value(ProductView::for_viewer(product(me.id), &me)).unwrap();
        assert_eq!(mine["is_owner"], json!(true));
        assert_eq!(mine["name"], json!("Pen"));
        assert_eq!(mine["user_id"], json!(me.id));
        assert!(mine.get("profiles").is_none());

        let theirs =
            serde_json::to_value(ProductView::for_viewer(product(Uuid::new_v4()), &me)).unwrap();
        assert_eq!(theirs["is_owner"], json!(false));
    }

    #[test]
    fn listings_include_owner_summary() {
        let me = viewer();
        let listing = ProductListing {
            product: product(me.id),
            owner_display_name: Some("Alice".into()),
        };
        let value = serde_json::to_value(ProductView::from_listing(listing, &me)).unwrap();
        assert_eq!(value["profiles"], json!({ "display_name": "Alice" }));
        assert_eq!(value["is_owner"], json!(true));
    }
}
