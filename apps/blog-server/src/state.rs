//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::BlogService;
use blogicum_core::services::Repositories;
use blogicum_infra::{DatabaseConfig, InMemoryStore};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BlogService>,
    pub login_url: String,
}

impl AppState {
    pub fn new(service: BlogService, login_url: impl Into<String>) -> Self {
        Self {
            service: Arc::new(service),
            login_url: login_url.into(),
        }
    }

    /// Build the application state with the configured store.
    pub async fn from_config(config: &AppConfig) -> Self {
        let repos = Self::repositories(config.database.as_ref()).await;
        tracing::info!(page_size = config.blog.page_size, "Application state initialized");
        Self::new(BlogService::new(repos, config.blog), config.login_url.clone())
    }

    #[cfg(feature = "postgres")]
    async fn repositories(db_config: Option<&DatabaseConfig>) -> Repositories {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return InMemoryStore::new().repositories();
        };

        match blogicum_infra::database::connect(config).await {
            Ok(conn) => blogicum_infra::database::repositories(conn),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                InMemoryStore::new().repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_db_config: Option<&DatabaseConfig>) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory store");
        InMemoryStore::new().repositories()
    }
}
