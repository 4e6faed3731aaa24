use serde::Serialize;

use crate::commands::{build_runtime, load_config, CommandResult};
use packdeal_core::domain::pack::Pack;
use packdeal_db::{connect_with_config, PackRepository, SqlPackRepository};

#[derive(Debug, Serialize)]
struct PackRow {
    id: String,
    name: String,
    discount: f64,
    product_count: usize,
}

impl From<&Pack> for PackRow {
    fn from(pack: &Pack) -> Self {
        Self {
            id: pack.id.to_string(),
            name: pack.name.clone(),
            discount: pack.discount,
            product_count: pack.product_count(),
        }
    }
}

pub fn run() -> CommandResult {
    let config = match load_config("list") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime("list") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let packs = SqlPackRepository::new(pool.clone())
            .list_packs()
            .await
            .map_err(|error| ("db_query", error.to_string(), 5u8));

        pool.close().await;
        packs
    });

    match result {
        Ok(packs) => {
            let rows: Vec<PackRow> = packs.iter().map(PackRow::from).collect();
            let details = serde_json::to_value(&rows).ok();
            let message = format!("{} pack(s) stored", rows.len());
            CommandResult::success_with_details("list", message, details)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("list", error_class, message, exit_code)
        }
    }
}
