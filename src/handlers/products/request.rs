//! Request schemas for the products resource.
//!
//! Bodies arrive as loosely typed JSON from browser forms: prices may be
//! numbers or numeric strings and optional text fields may be `""`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::database::{NewProduct, ProductPatch};
use crate::error::{ApiError, ApiResult};

pub const REQUIRED_FIELDS: &str = "Name and price are required";
const NON_POSITIVE_PRICE: &str = "Price must be greater than zero";
const EMPTY_NAME: &str = "Name cannot be empty";
const INVALID_IMAGE_URL: &str = "image_url must be a valid URL";

#[derive(Debug, Deserialize)]
struct CreateBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    price: Option<Decimal>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    #[serde(default, deserialize_with = "present")]
    name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_decimal")]
    price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    image_url: Option<Option<String>>,
}

/// Validated body of `POST /products`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn from_json(body: Value) -> ApiResult<Self> {
        if !body.is_object() {
            return Err(ApiError::bad_request(REQUIRED_FIELDS));
        }
        let raw: CreateBody =
            serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))?;

        let name = raw.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let price = raw.price.filter(|p| !p.is_zero());
        let (Some(name), Some(price)) = (name, price) else {
            return Err(ApiError::bad_request(REQUIRED_FIELDS));
        };
        if price.is_sign_negative() {
            return Err(ApiError::bad_request(NON_POSITIVE_PRICE));
        }

        Ok(Self {
            name,
            description: blank_to_none(raw.description),
            price,
            image_url: image_url(raw.image_url)?,
        })
    }

    /// Any owner the client sent is ignored; the row belongs to `owner`.
    pub fn into_new_product(self, owner: Uuid) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            user_id: owner,
        }
    }
}

/// Validate the body of `PUT /products/:id`. Identity and ownership fields
/// are dropped before anything else is read.
pub fn patch_from_json(body: Value) -> ApiResult<ProductPatch> {
    let Value::Object(mut fields) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };
    fields.remove("id");
    fields.remove("user_id");

    let raw: UpdateBody = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let name = match raw.name {
        None => None,
        Some(name) => {
            let name = name.map(|n| n.trim().to_string()).unwrap_or_default();
            if name.is_empty() {
                return Err(ApiError::bad_request(EMPTY_NAME));
            }
            Some(name)
        }
    };

    let price = match raw.price {
        None => None,
        Some(Some(price)) if price > Decimal::ZERO => Some(price),
        Some(_) => return Err(ApiError::bad_request(NON_POSITIVE_PRICE)),
    };

    Ok(ProductPatch {
        name,
        description: raw.description.map(blank_to_none),
        price,
        image_url: raw.image_url.map(image_url).transpose()?,
    })
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn image_url(value: Option<String>) -> ApiResult<Option<String>> {
    match blank_to_none(value) {
        None => Ok(None),
        Some(raw) => {
            let raw = raw.trim().to_string();
            url::Url::parse(&raw).map_err(|_| ApiError::bad_request(INVALID_IMAGE_URL))?;
            Ok(Some(raw))
        }
    }
}

// Distinguishes an absent field (outer None) from an explicit null.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_decimal<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_decimal(deserializer).map(Some)
}

/// Accepts JSON numbers and numeric strings; `null` and `""` read as absent.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()).map(Some).map_err(de::Error::custom),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_decimal(s.trim()).map(Some).map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!("invalid price: {}", other))),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| format!("invalid price: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: Value) -> ApiResult<CreateProductRequest> {
        CreateProductRequest::from_json(body)
    }

    #[test]
    fn create_requires_name_and_price() {
        for body in [
            json!({ "description": "x" }),
            json!({ "name": "Pen" }),
            json!({ "price": 1.5 }),
            json!({ "name": "", "price": 1.5 }),
            json!({ "name": "Pen", "price": 0 }),
            json!({ "name": "Pen", "price": "" }),
            json!({ "name": null, "price": 3 }),
            json!([]),
        ] {
            assert_eq!(create(body).unwrap_err(), ApiError::bad_request(REQUIRED_FIELDS));
        }
    }

    #[test]
    fn whitespace_only_name_counts_as_missing() {
        assert_eq!(
            create(json!({ "name": "   ", "price": 1 })).unwrap_err(),
            ApiError::bad_request(REQUIRED_FIELDS)
        );
        assert_eq!(
            patch_from_json(json!({ "name": " \t" })).unwrap_err(),
            ApiError::bad_request(EMPTY_NAME)
        );
    }

    #[test]
    fn create_accepts_numeric_strings_and_normalizes_blanks() {
        let request = create(json!({
            "name": "  Pen ",
            "price": "1.50",
            "description": "",
            "image_url": "",
        }))
        .unwrap();

        assert_eq!(request.name, "Pen");
        assert_eq!(request.price, Decimal::new(150, 2));
        assert_eq!(request.description, None);
        assert_eq!(request.image_url, None);
    }

    #[test]
    fn create_rejects_bad_values() {
        assert_eq!(
            create(json!({ "name": "Pen", "price": -2 })).unwrap_err(),
            ApiError::bad_request(NON_POSITIVE_PRICE)
        );
        assert_eq!(
            create(json!({ "name": "Pen", "price": 2, "image_url": "not a url" })).unwrap_err(),
            ApiError::bad_request(INVALID_IMAGE_URL)
        );
        assert_eq!(
            create(json!({ "name": 42, "price": 2 })).unwrap_err().status_code(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn create_ignores_client_owner() {
        let owner = Uuid::new_v4();
        let request = create(json!({
            "name": "Pen",
            "price": 1.5,
            "user_id": Uuid::new_v4(),
        }))
        .unwrap();

        assert_eq!(request.into_new_product(owner).user_id, owner);
    }

    #[test]
    fn patch_strips_identity_fields() {
        let patch = patch_from_json(json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "name": "Pencil",
        }))
        .unwrap();

        assert_eq!(
            patch,
            ProductPatch {
                name: Some("Pencil".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn patch_distinguishes_absent_from_cleared() {
        let patch = patch_from_json(json!({ "description": null, "image_url": "" })).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.image_url, Some(None));
        assert_eq!(patch.name, None);
        assert_eq!(patch.price, None);

        assert!(patch_from_json(json!({})).unwrap().is_empty());
    }

    #[test]
    fn patch_validates_supplied_fields() {
        assert_eq!(
            patch_from_json(json!({ "name": "" })).unwrap_err(),
            ApiError::bad_request(EMPTY_NAME)
        );
        assert_eq!(
            patch_from_json(json!({ "price": 0 })).unwrap_err(),
            ApiError::bad_request(NON_POSITIVE_PRICE)
        );
        assert_eq!(
            patch_from_json(json!({ "price": null })).unwrap_err(),
            ApiError::bad_request(NON_POSITIVE_PRICE)
        );
        assert_eq!(
            patch_from_json(json!({ "price": "2.25" })).unwrap().price,
            Some(Decimal::new(225, 2))
        );
        assert!(patch_from_json(json!("name")).is_err());
    }
}
