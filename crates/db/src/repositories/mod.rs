use async_trait::async_trait;
use thiserror::Error;

use packdeal_core::domain::pack::{NewPack, Pack, PackId};
use packdeal_core::domain::product::ProductId;
use packdeal_core::errors::ApplicationError;

pub mod memory;
pub mod pack;

pub use memory::InMemoryPackRepository;
pub use pack::SqlPackRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        Self::Persistence(value.to_string())
    }
}

/// Storage for packs and the product associations they own.
///
/// Absence is reported as `None`/`false`, never as an error.
#[async_trait]
pub trait PackRepository: Send + Sync {
    /// All packs with their associations, oldest first.
    async fn list_packs(&self) -> Result<Vec<Pack>, RepositoryError>;

    async fn find_by_id(&self, id: &PackId) -> Result<Option<Pack>, RepositoryError>;

    async fn create_pack(&self, name: &str, discount: f64) -> Result<Pack, RepositoryError>;

    /// Appends associations to an existing pack. Ids already linked are skipped.
    async fn create_associations(
        &self,
        pack_id: &PackId,
        product_ids: &[ProductId],
    ) -> Result<(), RepositoryError>;

    /// Persists the pack and its associations atomically.
    async fn create_pack_with_products(&self, new_pack: NewPack) -> Result<Pack, RepositoryError>;

    async fn update_pack(
        &self,
        id: &PackId,
        name: &str,
        discount: f64,
    ) -> Result<Option<Pack>, RepositoryError>;

    /// Returns whether a pack was removed.
    async fn delete_pack(&self, id: &PackId) -> Result<bool, RepositoryError>;
}

pub(crate) fn new_pack_id() -> PackId {
    PackId(uuid::Uuid::new_v4().to_string())
}
