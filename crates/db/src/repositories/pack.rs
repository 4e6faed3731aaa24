use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use packdeal_core::domain::pack::{NewPack, Pack, PackId, ProductAssociation};
use packdeal_core::domain::product::ProductId;

use super::{new_pack_id, PackRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPackRepository {
    pool: DbPool,
}

impl SqlPackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column} `{raw}`: {e}")))
}

fn row_to_pack(
    row: &sqlx::sqlite::SqliteRow,
    products: Vec<ProductAssociation>,
) -> Result<Pack, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let discount: f64 =
        row.try_get("discount").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Pack {
        id: PackId(id),
        name,
        discount,
        products,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

async fn insert_pack(
    conn: &mut SqliteConnection,
    name: &str,
    discount: f64,
) -> Result<PackId, RepositoryError> {
    let id = new_pack_id();
    let now = format_timestamp(&timestamp_now());

    sqlx::query(
        "INSERT INTO pack (id, name, discount, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id.0)
    .bind(name)
    .bind(discount)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

async fn insert_associations(
    conn: &mut SqliteConnection,
    pack_id: &PackId,
    product_ids: &[ProductId],
) -> Result<(), RepositoryError> {
    let next_position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM pack_product WHERE pack_id = ?",
    )
    .bind(&pack_id.0)
    .fetch_one(&mut *conn)
    .await?;

    for (offset, product_id) in product_ids.iter().enumerate() {
        let position = next_position + i64::try_from(offset).unwrap_or(i64::MAX);
        sqlx::query(
            "INSERT OR IGNORE INTO pack_product (pack_id, product_id, position)
             VALUES (?, ?, ?)",
        )
        .bind(&pack_id.0)
        .bind(&product_id.0)
        .bind(position)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn load_associations(
    conn: &mut SqliteConnection,
    pack_id: &PackId,
) -> Result<Vec<ProductAssociation>, RepositoryError> {
    let product_ids: Vec<String> = sqlx::query_scalar(
        "SELECT product_id FROM pack_product WHERE pack_id = ? ORDER BY position ASC",
    )
    .bind(&pack_id.0)
    .fetch_all(&mut *conn)
    .await?;

    Ok(product_ids
        .into_iter()
        .map(|product_id| ProductAssociation {
            pack_id: pack_id.clone(),
            product_id: ProductId(product_id),
        })
        .collect())
}

async fn load_pack(
    conn: &mut SqliteConnection,
    id: &PackId,
) -> Result<Option<Pack>, RepositoryError> {
    let row = sqlx::query(
        "SELECT id, name, discount, created_at, updated_at
         FROM pack WHERE id = ?",
    )
    .bind(&id.0)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(ref r) => {
            let products = load_associations(conn, id).await?;
            Ok(Some(row_to_pack(r, products)?))
        }
        None => Ok(None),
    }
}

async fn require_pack(conn: &mut SqliteConnection, id: &PackId) -> Result<Pack, RepositoryError> {
    load_pack(conn, id)
        .await?
        .ok_or_else(|| RepositoryError::Constraint(format!("pack `{id}` vanished after write")))
}

#[async_trait::async_trait]
impl PackRepository for SqlPackRepository {
    async fn list_packs(&self) -> Result<Vec<Pack>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, name, discount, created_at, updated_at
             FROM pack ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        let association_rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT pack_id, product_id FROM pack_product ORDER BY pack_id ASC, position ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut associations: HashMap<String, Vec<ProductAssociation>> = HashMap::new();
        for (pack_id, product_id) in association_rows {
            associations.entry(pack_id.clone()).or_default().push(ProductAssociation {
                pack_id: PackId(pack_id),
                product_id: ProductId(product_id),
            });
        }

        rows.iter()
            .map(|row| {
                let id: String =
                    row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                row_to_pack(row, associations.remove(&id).unwrap_or_default())
            })
            .collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &PackId) -> Result<Option<Pack>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_pack(&mut conn, id).await
    }

    async fn create_pack(&self, name: &str, discount: f64) -> Result<Pack, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_pack(&mut conn, name, discount).await?;
        debug!(event_name = "db.pack.created", pack_id = %id, "pack row inserted");
        require_pack(&mut conn, &id).await
    }

    async fn create_associations(
        &self,
        pack_id: &PackId,
        product_ids: &[ProductId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // an empty id list never reaches the foreign key, so check the pack directly
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM pack WHERE id = ?")
            .bind(&pack_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::Constraint(format!("pack `{pack_id}` does not exist")));
        }

        insert_associations(&mut tx, pack_id, product_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_pack_with_products(&self, new_pack: NewPack) -> Result<Pack, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id = insert_pack(&mut tx, &new_pack.name, new_pack.discount).await?;
        insert_associations(&mut tx, &id, &new_pack.product_ids).await?;
        let pack = require_pack(&mut tx, &id).await?;

        tx.commit().await?;
        debug!(
            event_name = "db.pack.created",
            pack_id = %pack.id,
            product_count = pack.product_count(),
            "pack and associations inserted"
        );
        Ok(pack)
    }

    async fn update_pack(
        &self,
        id: &PackId,
        name: &str,
        discount: f64,
    ) -> Result<Option<Pack>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE pack SET name = ?, discount = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(discount)
            .bind(format_timestamp(&timestamp_now()))
            .bind(&id.0)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let pack = load_pack(&mut tx, id).await?;
        tx.commit().await?;
        Ok(pack)
    }

    async fn delete_pack(&self, id: &PackId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM pack WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
