use std::sync::Arc;

use crate::config::Config;
use advisordesk_core::{
    cas::{
        CasService, CasServiceTrait, CommandParserGateway, CredentialVault, FileStager,
        ParserGatewayTrait,
    },
    clients::{ClientRepositoryTrait, ClientService, ClientServiceTrait},
};
use advisordesk_storage_sqlite::{clients::ClientRepository, db, DbPool};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub client_service: Arc<dyn ClientServiceTrait + Send + Sync>,
    pub cas_service: Arc<dyn CasServiceTrait + Send + Sync>,
    pub pool: Arc<DbPool>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("ADV_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let parser = Arc::new(CommandParserGateway::new(
        &config.cas_parser_cmd,
        config.cas_parser_args.clone(),
    ));
    tracing::info!("CAS parser command: {}", parser.program().display());
    build_state_with_parser(config, parser).await
}

/// Wires storage and services around the given parser gateway.
pub async fn build_state_with_parser(
    config: &Config,
    parser: Arc<dyn ParserGatewayTrait>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let client_repository: Arc<dyn ClientRepositoryTrait> =
        Arc::new(ClientRepository::new(pool.clone(), writer));
    let client_service = Arc::new(ClientService::new(client_repository.clone()));

    let vault = CredentialVault::new(config.cas_encryption_key.as_deref());
    if !vault.is_configured() {
        tracing::warn!(
            "ADV_CAS_ENCRYPTION_KEY is not set; password-protected CAS uploads will be rejected"
        );
    }
    let stager = FileStager::new(&config.cas_storage_dir)?;
    tracing::info!("CAS storage directory: {}", stager.root().display());

    let cas_service = Arc::new(CasService::new(
        client_repository,
        Arc::new(vault),
        Arc::new(stager),
        parser,
    ));

    Ok(Arc::new(AppState {
        client_service,
        cas_service,
        pool,
        db_path,
    }))
}
