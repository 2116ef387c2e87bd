//! # Grid Configuration
//!
//! Configuration management for the Grid integration.
//! All secrets are loaded from environment variables.
//!
//! Every `from_env` constructor has a `from_lookup` twin that takes the
//! variable source as a closure, so tests never touch the process environment.

use grid_core::{GridEnvironment, GridError, GridResult};
use std::env;
use std::fmt;
use tracing::warn;

/// Grid API base URL used when `GRID_ENDPOINT` is unset
pub const DEFAULT_BASE_URL: &str = "https://grid.squads.xyz/api/grid/v1";

/// Appended to the visible prefix of a masked secret
pub const REDACTION_MARKER: &str = "...";

const VISIBLE_KEY_CHARS: usize = 8;

pub const API_KEY_VAR: &str = "GRID_API_KEY";
pub const ENVIRONMENT_VAR: &str = "GRID_ENVIRONMENT";
pub const ENDPOINT_VAR: &str = "GRID_ENDPOINT";
pub const APP_ENV_VAR: &str = "APP_ENV";
pub const ADVISOR_API_KEY_VAR: &str = "ADVISOR_API_KEY";

/// Keep the first eight characters of a secret and redact the rest.
/// Secrets no longer than the visible prefix are redacted entirely.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= VISIBLE_KEY_CHARS {
        return REDACTION_MARKER.to_string();
    }
    let visible: String = secret.chars().take(VISIBLE_KEY_CHARS).collect();
    format!("{}{}", visible, REDACTION_MARKER)
}

/// Read a variable, treating blank values as unset
pub(crate) fn read_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Grid API connection parameters
#[derive(Clone, PartialEq)]
pub struct GridConfig {
    /// Deployment tag sent as `x-grid-environment`
    pub environment: GridEnvironment,

    /// API key (secret, never logged in full)
    pub api_key: String,

    /// Custom API base URL
    pub base_url: Option<String>,
}

impl GridConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GRID_API_KEY`
    ///
    /// Optional:
    /// - `GRID_ENVIRONMENT` (default `sandbox`)
    /// - `GRID_ENDPOINT`
    pub fn from_env() -> GridResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> GridResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = read_var(&lookup, API_KEY_VAR).ok_or_else(|| {
            GridError::config(format!(
                "{} is required. Set it in your .env file or environment variables.",
                API_KEY_VAR
            ))
        })?;

        let environment = match read_var(&lookup, ENVIRONMENT_VAR) {
            Some(raw) => raw.parse::<GridEnvironment>().map_err(GridError::config)?,
            None => GridEnvironment::default(),
        };

        let base_url = read_var(&lookup, ENDPOINT_VAR);
        if let Some(url) = &base_url {
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                GridError::config(format!("{} is not a valid URL: {}", ENDPOINT_VAR, e))
            })?;
            if parsed.cannot_be_a_base() {
                return Err(GridError::config(format!(
                    "{} must be an absolute http(s) URL",
                    ENDPOINT_VAR
                )));
            }
        }

        Ok(Self {
            environment,
            api_key,
            base_url,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            environment: GridEnvironment::Sandbox,
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

impl fmt::Debug for GridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridConfig")
            .field("environment", &self.environment)
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// Deployment stage of the process, from `APP_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnvironment {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match read_var(&lookup, APP_ENV_VAR).as_deref() {
            None => AppEnvironment::Development,
            Some(raw) => match raw.to_lowercase().as_str() {
                "development" | "dev" => AppEnvironment::Development,
                "production" | "prod" => AppEnvironment::Production,
                "test" => AppEnvironment::Test,
                other => {
                    warn!("Unrecognized {}={}, assuming development", APP_ENV_VAR, other);
                    AppEnvironment::Development
                }
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        *self == AppEnvironment::Production
    }

    pub fn is_development(&self) -> bool {
        *self == AppEnvironment::Development
    }

    pub fn is_test(&self) -> bool {
        *self == AppEnvironment::Test
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the pricing advisor. Absent means the advisory feature
/// is switched off; it never blocks the payments client.
#[derive(Clone, PartialEq)]
pub struct AdvisorSettings {
    pub api_key: String,
}

impl AdvisorSettings {
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match read_var(&lookup, ADVISOR_API_KEY_VAR) {
            Some(api_key) => Some(Self { api_key }),
            None => {
                warn!("{} not set, pricing advisor disabled", ADVISOR_API_KEY_VAR);
                None
            }
        }
    }
}

impl fmt::Debug for AdvisorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorSettings")
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::GridErrorKind;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_minimal() {
        let config = GridConfig::from_lookup(vars(&[("GRID_API_KEY", "grid_sk_abcdef123456")])).unwrap();

        assert_eq!(config.environment, GridEnvironment::Sandbox);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.auth_header(), "Bearer grid_sk_abcdef123456");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GridConfig::from_lookup(vars(&[])).unwrap_err();
        assert!(err.is(GridErrorKind::Config));
        assert!(err.message().contains("GRID_API_KEY"));

        let err = GridConfig::from_lookup(vars(&[("GRID_API_KEY", "   ")])).unwrap_err();
        assert!(err.is(GridErrorKind::Config));
    }

    #[test]
    fn test_unsupported_environment() {
        let err = GridConfig::from_lookup(vars(&[
            ("GRID_API_KEY", "key"),
            ("GRID_ENVIRONMENT", "mainnet"),
        ]))
        .unwrap_err();
        assert!(err.is(GridErrorKind::Config));
    }

    #[test]
    fn test_custom_endpoint() {
        let config = GridConfig::from_lookup(vars(&[
            ("GRID_API_KEY", "key"),
            ("GRID_ENDPOINT", "http://localhost:9000/v1"),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:9000/v1");

        let err = GridConfig::from_lookup(vars(&[
            ("GRID_API_KEY", "key"),
            ("GRID_ENDPOINT", "not a url"),
        ]))
        .unwrap_err();
        assert!(err.is(GridErrorKind::Config));
    }

    #[test]
    fn test_masking() {
        let config = GridConfig::new("grid_sk_abcdef123456");
        assert_eq!(config.masked_api_key(), "grid_sk_...");
        assert_eq!(mask_secret("short"), REDACTION_MARKER);
        assert_eq!(mask_secret("sk_12345"), REDACTION_MARKER);
        assert_eq!(mask_secret("sk_123456"), "sk_12345...");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("abcdef123456"));
    }

    #[test]
    fn test_app_environment() {
        assert!(AppEnvironment::from_lookup(vars(&[])).is_development());
        assert!(AppEnvironment::from_lookup(vars(&[("APP_ENV", "production")])).is_production());
        assert!(AppEnvironment::from_lookup(vars(&[("APP_ENV", "TEST")])).is_test());
        assert!(AppEnvironment::from_lookup(vars(&[("APP_ENV", "staging")])).is_development());
    }

    #[test]
    fn test_advisor_is_optional() {
        assert!(AdvisorSettings::from_lookup(vars(&[])).is_none());

        let advisor = AdvisorSettings::from_lookup(vars(&[("ADVISOR_API_KEY", "adv_123456789")])).unwrap();
        assert_eq!(advisor.api_key, "adv_123456789");
        assert!(!format!("{:?}", advisor).contains("adv_123456789"));
    }
}
