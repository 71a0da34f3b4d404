//! Checkout client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCATO_API_BASE_URL` - Base URL of the platform API (e.g., `https://shop.example.com/api`)
//! - `MERCATO_API_TOKEN` - Bearer token for the current customer session
//! - `MERCATO_TENANT` - Tenant identifier, sent as the `X-Tenant` header
//!
//! ## Optional
//! - `MERCATO_LANG` - Localized-language header value (default: en)
//! - `MERCATO_UPLOAD_URL` - Receipt upload endpoint (default: `{base}/upload`)

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront checkout client configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Base URL of the platform API, without a trailing slash.
    pub base_url: String,
    /// Bearer token for the current customer session.
    pub api_token: SecretString,
    /// Tenant identifier, sent as `X-Tenant` on every request.
    pub tenant: String,
    /// Language for localized responses, sent as `Accept-Language`.
    pub language: String,
    /// Receipt upload endpoint.
    pub upload_url: String,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("tenant", &self.tenant)
            .field("language", &self.language)
            .field("upload_url", &self.upload_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or the base
    /// URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("MERCATO_API_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("MERCATO_API_BASE_URL".to_string(), e.to_string())
        })?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let api_token = SecretString::from(get_required_env("MERCATO_API_TOKEN")?);
        let tenant = get_required_env("MERCATO_TENANT")?;
        let language = get_env_or_default("MERCATO_LANG", "en");
        let upload_url =
            get_optional_env("MERCATO_UPLOAD_URL").unwrap_or_else(|| format!("{base_url}/upload"));

        Ok(Self {
            base_url,
            api_token,
            tenant,
            language,
            upload_url,
        })
    }

    /// Build a configuration for an already-issued session.
    ///
    /// Auth, tenant, and locale are explicit parameters here rather than
    /// ambient lookups; this is also the entry point tests use.
    #[must_use]
    pub fn for_session(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        tenant: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let upload_url = format!("{base_url}/upload");
        Self {
            base_url,
            api_token: SecretString::from(api_token.into()),
            tenant: tenant.into(),
            language: language.into(),
            upload_url,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_for_session_strips_trailing_slash() {
        let config = StorefrontConfig::for_session(
            "https://shop.example.com/api/",
            "token-value",
            "tenant-a",
            "en",
        );
        assert_eq!(config.base_url, "https://shop.example.com/api");
        assert_eq!(config.upload_url, "https://shop.example.com/api/upload");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = StorefrontConfig::for_session(
            "https://shop.example.com/api",
            "super_secret_bearer_token",
            "tenant-a",
            "am",
        );
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("tenant-a"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_bearer_token"));
    }
}
