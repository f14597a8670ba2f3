//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over the repository traits, but AppState pins them to
//! the concrete SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use keepsake_core::memory::cache::SessionCache;
use keepsake_core::provider::boxed::BoxGenerativeProvider;
use keepsake_core::service::ask::AskService;
use keepsake_core::service::finalize::FinalizeService;
use keepsake_core::service::session::SessionService;
use keepsake_infra::config::{self, KeepsakeConfig};
use keepsake_infra::provider::openai_compat::OpenAiCompatProvider;
use keepsake_infra::sqlite::pool::DatabasePool;
use keepsake_infra::sqlite::primer::SqlitePrimerRepository;
use keepsake_infra::sqlite::session::SqliteSessionRepository;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteSessionService = SessionService<SqliteSessionRepository>;

pub type ConcreteAskService = AskService<SqliteSessionRepository, SqlitePrimerRepository>;

pub type ConcreteFinalizeService =
    FinalizeService<SqliteSessionRepository, SqlitePrimerRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<ConcreteSessionService>,
    pub ask_service: Arc<ConcreteAskService>,
    pub finalize_service: Arc<ConcreteFinalizeService>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = config::data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = config::load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("keepsake.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        Self::wire(db_pool, config, data_dir)
    }

    /// Wire services onto an existing pool. Split from [`AppState::init`]
    /// so tests can use a tempdir database and an explicit config.
    pub fn wire(
        db_pool: DatabasePool,
        config: KeepsakeConfig,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let provider = build_provider(&config)?;
        let engine_config = config.engine;
        let provider_config = config
            .provider
            .map(|section| section.settings)
            .unwrap_or_default();

        // One cache shared by every service so invalidations are seen everywhere.
        let cache = SessionCache::new();

        let session_service = SessionService::new(
            SqliteSessionRepository::new(db_pool.clone()),
            cache.clone(),
        );

        let ask_service = AskService::new(
            SqliteSessionRepository::new(db_pool.clone()),
            SqlitePrimerRepository::new(db_pool.clone()),
            provider,
            cache.clone(),
            engine_config.clone(),
            provider_config,
        );

        let finalize_service = FinalizeService::new(
            SqliteSessionRepository::new(db_pool.clone()),
            SqlitePrimerRepository::new(db_pool.clone()),
            cache,
            engine_config,
        );

        Ok(Self {
            session_service: Arc::new(session_service),
            ask_service: Arc::new(ask_service),
            finalize_service: Arc::new(finalize_service),
            data_dir,
            db_pool,
        })
    }
}

/// Build the generative provider from config, or `None` for offline mode.
fn build_provider(config: &KeepsakeConfig) -> anyhow::Result<Option<BoxGenerativeProvider>> {
    let Some(section) = &config.provider else {
        tracing::info!("no [provider] configured; running offline");
        return Ok(None);
    };

    let Some(api_key) = &section.api_key else {
        tracing::warn!("[provider] has no api_key; running offline");
        return Ok(None);
    };

    let mut client = OpenAiCompatProvider::new(api_key.clone())
        .map_err(|e| anyhow::anyhow!("failed to build provider client: {e}"))?;
    if let Some(base_url) = &section.base_url {
        client = client.with_base_url(base_url.clone());
    }

    Ok(Some(BoxGenerativeProvider::new(client)))
}
