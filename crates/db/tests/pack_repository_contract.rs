use packdeal_core::domain::pack::{NewPack, PackId};
use packdeal_core::domain::product::ProductId;
use packdeal_db::{
    connect_with_settings, migrations, InMemoryPackRepository, PackRepository, RepositoryError,
    SqlPackRepository,
};

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn sql_repository() -> ContractResult<SqlPackRepository> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    Ok(SqlPackRepository::new(pool))
}

fn product_ids(raw: &[&str]) -> Vec<ProductId> {
    raw.iter().map(|id| ProductId((*id).to_string())).collect()
}

async fn read_is_idempotent(repository: &dyn PackRepository) -> ContractResult {
    let pack = repository
        .create_pack_with_products(NewPack {
            name: "Test Pack".to_string(),
            discount: 25.0,
            product_ids: product_ids(&["gid://shopify/Product/1", "gid://shopify/Product/2"]),
        })
        .await
        .map_err(|error| format!("create: {error}"))?;

    let first = repository.find_by_id(&pack.id).await.map_err(|error| error.to_string())?;
    let second = repository.find_by_id(&pack.id).await.map_err(|error| error.to_string())?;

    require!(first.is_some(), "created pack should be readable");
    require_eq!(first, second);
    Ok(())
}

async fn create_round_trips_name_and_discount(repository: &dyn PackRepository) -> ContractResult {
    let created = repository
        .create_pack("Test Pack", 12.5)
        .await
        .map_err(|error| format!("create: {error}"))?;
    let found = repository
        .find_by_id(&created.id)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "created pack should be readable".to_string())?;

    require_eq!(found.name.as_str(), "Test Pack");
    require_eq!(found.discount, 12.5);
    Ok(())
}

async fn absence_is_not_an_error(repository: &dyn PackRepository) -> ContractResult {
    let missing = PackId("does-not-exist".to_string());

    let found = repository.find_by_id(&missing).await.map_err(|error| error.to_string())?;
    require!(found.is_none(), "unknown id should read as None");

    let updated =
        repository.update_pack(&missing, "Name", 10.0).await.map_err(|error| error.to_string())?;
    require!(updated.is_none(), "updating an unknown id should yield None");

    let deleted = repository.delete_pack(&missing).await.map_err(|error| error.to_string())?;
    require!(!deleted, "deleting an unknown id should report false");
    Ok(())
}

async fn associations_are_deduplicated(repository: &dyn PackRepository) -> ContractResult {
    let pack = repository
        .create_pack_with_products(NewPack {
            name: "Dupes".to_string(),
            discount: 5.0,
            product_ids: product_ids(&["a", "b"]),
        })
        .await
        .map_err(|error| error.to_string())?;

    repository
        .create_associations(&pack.id, &product_ids(&["b", "c"]))
        .await
        .map_err(|error| error.to_string())?;

    let found = repository
        .find_by_id(&pack.id)
        .await
        .map_err(|error| error.to_string())?
        .ok_or_else(|| "pack should exist".to_string())?;
    require_eq!(found.product_ids(), product_ids(&["a", "b", "c"]));
    Ok(())
}

async fn associations_require_an_existing_pack(repository: &dyn PackRepository) -> ContractResult {
    let missing = PackId("does-not-exist".to_string());

    for selection in [product_ids(&["a"]), Vec::new()] {
        let result = repository.create_associations(&missing, &selection).await;
        require!(
            matches!(result, Err(RepositoryError::Constraint(_))),
            "associating {selection:?} with an unknown pack should be a constraint error, got {result:?}"
        );
    }
    Ok(())
}

async fn delete_removes_pack_from_listing(repository: &dyn PackRepository) -> ContractResult {
    let keep = repository.create_pack("Keep", 10.0).await.map_err(|error| error.to_string())?;
    let drop = repository.create_pack("Drop", 20.0).await.map_err(|error| error.to_string())?;

    let deleted = repository.delete_pack(&drop.id).await.map_err(|error| error.to_string())?;
    require!(deleted, "existing pack should be deleted");

    let listed = repository.list_packs().await.map_err(|error| error.to_string())?;
    require!(listed.iter().any(|pack| pack.id == keep.id), "kept pack should still be listed");
    require!(listed.iter().all(|pack| pack.id != drop.id), "deleted pack should not be listed");
    Ok(())
}

async fn run_contract(repository: &dyn PackRepository) -> ContractResult {
    read_is_idempotent(repository).await?;
    create_round_trips_name_and_discount(repository).await?;
    absence_is_not_an_error(repository).await?;
    associations_are_deduplicated(repository).await?;
    associations_require_an_existing_pack(repository).await?;
    delete_removes_pack_from_listing(repository).await?;
    Ok(())
}

#[tokio::test]
async fn sql_repository_honors_pack_contract() -> ContractResult {
    let repository = sql_repository().await?;
    run_contract(&repository).await
}

#[tokio::test]
async fn in_memory_repository_honors_pack_contract() -> ContractResult {
    let repository = InMemoryPackRepository::default();
    run_contract(&repository).await
}
