use serde::{Deserialize, Serialize};

/// Category assigned to products whose source category is missing.
pub const FALLBACK_CATEGORY: &str = "other";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_name: String,
}

/// One row of the category-name lookup (source language -> English).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTranslation {
    pub category_name: String,
    pub category_name_english: String,
}
