use std::sync::Arc;

use packdeal_core::catalog::CatalogError;
use packdeal_core::config::{AppConfig, ConfigError, LoadOptions};
use packdeal_db::{connect_with_config, migrations, DbPool, SqlPackRepository};
use thiserror::Error;
use tracing::info;

use crate::catalog::AdminGraphqlCatalog;
use crate::packs::PackService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub packs: PackService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("catalog client setup failed: {0}")]
    Catalog(#[source] CatalogError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        pack_id = "unknown",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        pack_id = "unknown",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        pack_id = "unknown",
        "database migrations applied"
    );

    let catalog = AdminGraphqlCatalog::from_config(&config.catalog).map_err(BootstrapError::Catalog)?;
    info!(
        event_name = "system.bootstrap.catalog_ready",
        correlation_id = "bootstrap",
        pack_id = "unknown",
        endpoint = %catalog.endpoint(),
        "catalog client configured"
    );

    let packs =
        PackService::new(Arc::new(SqlPackRepository::new(db_pool.clone())), Arc::new(catalog));

    Ok(Application { config, db_pool, packs })
}
