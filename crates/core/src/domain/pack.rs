use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(pub String);

impl PackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAssociation {
    pub pack_id: PackId,
    pub product_id: ProductId,
}

/// A named bundle of catalog products sold at a percentage discount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub id: PackId,
    pub name: String,
    pub discount: f64,
    pub products: Vec<ProductAssociation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pack {
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.products.iter().map(|association| association.product_id.clone()).collect()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

/// A pack together with its initial product selection, persisted as one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPack {
    pub name: String,
    pub discount: f64,
    pub product_ids: Vec<ProductId>,
}
