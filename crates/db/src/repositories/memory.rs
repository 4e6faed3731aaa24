use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::RwLock;

use packdeal_core::domain::pack::{NewPack, Pack, PackId, ProductAssociation};
use packdeal_core::domain::product::ProductId;

use super::{new_pack_id, PackRepository, RepositoryError};

/// Vec-backed store; insertion order doubles as creation order.
#[derive(Default)]
pub struct InMemoryPackRepository {
    packs: RwLock<Vec<Pack>>,
}

fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn build_pack(name: &str, discount: f64) -> Pack {
    let now = timestamp_now();
    Pack {
        id: new_pack_id(),
        name: name.to_string(),
        discount,
        products: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn append_associations(pack: &mut Pack, product_ids: &[ProductId]) {
    for product_id in product_ids {
        if pack.products.iter().any(|association| &association.product_id == product_id) {
            continue;
        }
        pack.products
            .push(ProductAssociation { pack_id: pack.id.clone(), product_id: product_id.clone() });
    }
}

#[async_trait::async_trait]
impl PackRepository for InMemoryPackRepository {
    async fn list_packs(&self) -> Result<Vec<Pack>, RepositoryError> {
        let packs = self.packs.read().await;
        Ok(packs.clone())
    }

    async fn find_by_id(&self, id: &PackId) -> Result<Option<Pack>, RepositoryError> {
        let packs = self.packs.read().await;
        Ok(packs.iter().find(|pack| &pack.id == id).cloned())
    }

    async fn create_pack(&self, name: &str, discount: f64) -> Result<Pack, RepositoryError> {
        let pack = build_pack(name, discount);
        let mut packs = self.packs.write().await;
        packs.push(pack.clone());
        Ok(pack)
    }

    async fn create_associations(
        &self,
        pack_id: &PackId,
        product_ids: &[ProductId],
    ) -> Result<(), RepositoryError> {
        let mut packs = self.packs.write().await;
        let pack = packs
            .iter_mut()
            .find(|pack| &pack.id == pack_id)
            .ok_or_else(|| RepositoryError::Constraint(format!("pack `{pack_id}` does not exist")))?;
        append_associations(pack, product_ids);
        Ok(())
    }

    async fn create_pack_with_products(&self, new_pack: NewPack) -> Result<Pack, RepositoryError> {
        let mut pack = build_pack(&new_pack.name, new_pack.discount);
        append_associations(&mut pack, &new_pack.product_ids);

        let mut packs = self.packs.write().await;
        packs.push(pack.clone());
        Ok(pack)
    }

    async fn update_pack(
        &self,
        id: &PackId,
        name: &str,
        discount: f64,
    ) -> Result<Option<Pack>, RepositoryError> {
        let mut packs = self.packs.write().await;
        let Some(pack) = packs.iter_mut().find(|pack| &pack.id == id) else {
            return Ok(None);
        };

        pack.name = name.to_string();
        pack.discount = discount;
        pack.updated_at = timestamp_now();
        Ok(Some(pack.clone()))
    }

    async fn delete_pack(&self, id: &PackId) -> Result<bool, RepositoryError> {
        let mut packs = self.packs.write().await;
        let before = packs.len();
        packs.retain(|pack| &pack.id != id);
        Ok(packs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use packdeal_core::domain::pack::{NewPack, PackId};
    use packdeal_core::domain::product::ProductId;

    use crate::repositories::{InMemoryPackRepository, PackRepository, RepositoryError};

    #[tokio::test]
    async fn in_memory_pack_repo_round_trip() {
        let repo = InMemoryPackRepository::default();
        let pack = repo
            .create_pack_with_products(NewPack {
                name: "Test Pack".to_string(),
                discount: 25.0,
                product_ids: vec![ProductId("gid://shopify/Product/1".to_string())],
            })
            .await
            .expect("create pack");

        let found = repo.find_by_id(&pack.id).await.expect("find pack");
        assert_eq!(found, Some(pack));
    }

    #[tokio::test]
    async fn in_memory_delete_removes_associations_with_pack() {
        let repo = InMemoryPackRepository::default();
        let pack = repo.create_pack("Test Pack", 10.0).await.expect("create pack");
        repo.create_associations(&pack.id, &[ProductId("a".to_string())])
            .await
            .expect("associate");

        assert!(repo.delete_pack(&pack.id).await.expect("delete"));
        assert!(repo.find_by_id(&pack.id).await.expect("find").is_none());
        assert!(repo.list_packs().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn in_memory_associations_require_an_existing_pack() {
        let repo = InMemoryPackRepository::default();
        let result = repo
            .create_associations(&PackId("missing".to_string()), &[ProductId("a".to_string())])
            .await;
        assert!(matches!(result, Err(RepositoryError::Constraint(_))));
    }
}
