//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blogicum_core::pagination::DEFAULT_PAGE_SIZE;
use blogicum_core::services::BlogConfig;
use blogicum_infra::{DatabaseConfig, JwtConfig};

pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the blog on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub blog: BlogConfig,
    /// Where unauthenticated mutations are sent.
    pub login_url: String,
    pub jwt: JwtConfig,
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            config.max_connections = var_or("DB_MAX_CONNECTIONS", config.max_connections);
            config.min_connections = var_or("DB_MIN_CONNECTIONS", config.min_connections);
            config
        });

        let page_size = match var_or("PAGE_SIZE", DEFAULT_PAGE_SIZE) {
            0 => {
                tracing::warn!("PAGE_SIZE must be positive, using {}", DEFAULT_PAGE_SIZE);
                DEFAULT_PAGE_SIZE
            }
            size => size,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var_or("PORT", 8080),
            database,
            blog: BlogConfig { page_size },
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string()),
            jwt: JwtConfig::from_env(),
        }
    }
}
