//! # Application State
//!
//! Shared state for the Axum application: the Grid service, bind settings
//! and the optional advisor credentials.

use grid_client::{AdvisorSettings, AppEnvironment, GridService};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deployment stage from `APP_ENV`
    pub environment: AppEnvironment,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid PORT={:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            host,
            port,
            environment: AppEnvironment::from_lookup(&lookup),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: AppEnvironment::default(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Grid payments facade
    pub service: Arc<GridService>,
    /// Application config
    pub config: AppConfig,
    /// Pricing advisor credentials, when configured
    pub advisor: Option<AdvisorSettings>,
}

impl AppState {
    /// Build state from the process environment.
    ///
    /// The Grid API key is not required here; it is resolved on the first
    /// Grid call.
    pub fn new() -> anyhow::Result<Self> {
        let service = GridService::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to configure Grid service: {}", e))?;

        Ok(Self::with_service(
            service,
            AppConfig::from_env(),
            AdvisorSettings::from_env(),
        ))
    }

    pub fn with_service(
        service: GridService,
        config: AppConfig,
        advisor: Option<AdvisorSettings>,
    ) -> Self {
        Self {
            service: Arc::new(service),
            config,
            advisor,
        }
    }

    pub fn advisor_enabled(&self) -> bool {
        self.advisor.is_some()
    }
}
