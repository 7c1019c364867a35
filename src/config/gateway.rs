//! Payment gateway configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Gateway API key (client id)
    pub api_key: String,

    /// Gateway API secret, also used to sign webhooks
    pub api_secret: String,

    /// Base URL for the gateway REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout for gateway calls in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Default currency for new orders (3-letter ISO code)
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Accept webhooks that fail signature verification.
    ///
    /// Only honored outside production; the bypass is threaded into the
    /// webhook verifier at construction time and logged loudly on every use.
    #[serde(default)]
    pub allow_unverified_webhooks: bool,
}

impl GatewayConfig {
    /// Get the gateway request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate gateway configuration against the running environment
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_API_KEY"));
        }
        if self.api_secret.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_API_SECRET"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 60 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        if self.default_currency.len() != 3
            || !self.default_currency.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.allow_unverified_webhooks && *environment == Environment::Production {
            return Err(ValidationError::UnverifiedWebhooksInProduction);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            default_currency: default_currency(),
            allow_unverified_webhooks: false,
        }
    }
}

fn default_base_url() -> String {
    "https://api.gateway.example.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_currency() -> String {
    "USD".to_string()
}
