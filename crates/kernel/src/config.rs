//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use url::Url;

use crate::query::PagerConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. When unset, data lives in memory.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Public site URL used to build absolute pagination links.
    pub site_url: Url,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Default listing page size (default: 9).
    pub page_size: u32,

    /// Upper bound for the `size` parameter (default: 1000).
    pub max_page_size: u32,

    /// Per-request timeout in seconds (default: 30).
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let site_url = env::var("SITE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));
        let site_url = Url::parse(&site_url).context("SITE_URL must be an absolute URL")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let page_size = env::var("PAGE_SIZE")
            .unwrap_or_else(|_| "9".to_string())
            .parse()
            .context("PAGE_SIZE must be a valid u32")?;

        let max_page_size = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid u32")?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;

        let config = Self {
            port,
            database_url,
            database_max_connections,
            site_url,
            cors_allowed_origins,
            page_size,
            max_page_size,
            request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.page_size >= 1, "PAGE_SIZE must be at least 1");
        ensure!(
            self.max_page_size >= self.page_size,
            "MAX_PAGE_SIZE ({}) must not be below PAGE_SIZE ({})",
            self.max_page_size,
            self.page_size
        );
        Ok(())
    }

    pub fn pager(&self) -> PagerConfig {
        PagerConfig {
            default_size: self.page_size,
            max_size: self.max_page_size,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Defaults for everything except the site URL, with no database.
    pub fn with_site_url(site_url: Url) -> Self {
        let pager = PagerConfig::default();
        Self {
            port: 3000,
            database_url: None,
            database_max_connections: 10,
            site_url,
            cors_allowed_origins: vec!["*".to_string()],
            page_size: pager.default_size,
            max_page_size: pager.max_size,
            request_timeout_secs: 30,
        }
    }
}
