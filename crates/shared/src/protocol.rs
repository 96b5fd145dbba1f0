use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::NewProduct;

pub const PRODUCTS_PATH: &str = "products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query string of the product listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub sort_by: String,
    pub order: SortOrder,
}

impl ListProductsQuery {
    /// Most recently modified first.
    pub fn latest_first() -> Self {
        Self {
            sort_by: "modifiedDate".to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// Body of `POST /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(flatten)]
    pub product: NewProduct,
    pub modified_date: DateTime<Utc>,
}

impl CreateProductRequest {
    pub fn stamped(product: NewProduct, modified_date: DateTime<Utc>) -> Self {
        Self {
            product,
            modified_date,
        }
    }
}
