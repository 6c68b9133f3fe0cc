//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the page store, payment rail, image uploader and wallet proxy.

use crate::cloudinary::CloudinaryUploader;
use crate::db::{self, PgCheckoutPageStore};
use crate::okto::OktoClient;
use checkout_core::{
    action_path, blockchain_id, checkout_path, InMemoryCheckoutPageStore, SharedAssetUploader,
    SharedCheckoutPageStore, SharedPaymentRail,
};
use checkout_solana::{SolanaConfig, SolanaUsdcRail};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public URL checkout links are built from
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Postgres connection string; in-memory store when absent
    pub database_url: Option<SecretString>,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
    /// Solana cluster name, used for the blink chain id header
    pub cluster: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty())
                .map(SecretString::from),
            run_migrations: std::env::var("RUN_MIGRATIONS")
                .map(|v| v != "false")
                .unwrap_or(true),
            cluster: std::env::var("SOLANA_CLUSTER").unwrap_or_else(|_| "devnet".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// CAIP-2 id advertised in `X-Blockchain-Ids`
    pub fn blockchain_id(&self) -> &'static str {
        blockchain_id(&self.cluster)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            environment: "development".to_string(),
            database_url: None,
            run_migrations: true,
            cluster: "devnet".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout page persistence
    pub pages: SharedCheckoutPageStore,
    /// Purchase transaction builder
    pub rail: SharedPaymentRail,
    /// Image host; uploads fail with 500 when not configured
    pub uploader: Option<SharedAssetUploader>,
    /// Okto wallet proxy
    pub okto: OktoClient,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build state from the environment
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let pages: SharedCheckoutPageStore = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
                if config.run_migrations {
                    db::run_migrations(&pool).await?;
                }
                info!("Using Postgres checkout page store");
                Arc::new(PgCheckoutPageStore::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set, checkout pages are kept in memory");
                Arc::new(InMemoryCheckoutPageStore::new())
            }
        };

        let solana = SolanaConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load Solana config: {}", e))?;
        info!("Solana RPC: {} ({})", solana.rpc_url, solana.commitment);
        let rail = SolanaUsdcRail::new(solana);

        let uploader: Option<SharedAssetUploader> = match CloudinaryUploader::from_env() {
            Ok(uploader) => Some(Arc::new(uploader)),
            Err(e) => {
                warn!("Image uploads disabled: {}", e);
                None
            }
        };

        let okto = OktoClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Okto client: {}", e))?;

        Ok(Self {
            pages,
            rail: Arc::new(rail),
            uploader,
            okto,
            config,
        })
    }

    /// Absolute URL of a checkout page
    pub fn checkout_url(&self, id: i32) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            checkout_path(id)
        )
    }

    /// Absolute URL of a page's Solana Actions endpoint
    pub fn blink_url(&self, id: i32) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            action_path(id)
        )
    }
}
