use serde::{Deserialize, Serialize};

/// Catalog identifier of a product, e.g. `gid://shopify/Product/123`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live product data from the catalog. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProduct {
    pub id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub image_alt_text: Option<String>,
    pub min_variant_price_amount: String,
}
