use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::{ExternalProduct, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("catalog endpoint returned status {0}")]
    Status(u16),
    #[error("catalog returned GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

/// Batched product lookup against the external catalog.
///
/// Results come back in no particular order and may be shorter than `ids`
/// when some products no longer exist.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn fetch_products(&self, ids: &[ProductId])
        -> Result<Vec<ExternalProduct>, CatalogError>;
}

/// A fixed product list answering lookups locally.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    products: Vec<ExternalProduct>,
}

impl StaticCatalog {
    pub fn new(products: Vec<ExternalProduct>) -> Self {
        Self { products }
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&ExternalProduct> {
        self.products.iter().find(|product| &product.id == product_id)
    }
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    async fn fetch_products(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ExternalProduct>, CatalogError> {
        Ok(self.products.iter().filter(|product| ids.contains(&product.id)).cloned().collect())
    }
}
