//! API configuration

use serde::Deserialize;

use core_kernel::{Currency, Money};
use infra_payments::CheckoutConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Base URL of the hosted-checkout provider API
    pub checkout_base_url: String,
    /// Secret key for the checkout provider
    pub checkout_api_key: String,
    /// Timeout for checkout provider requests, in seconds
    pub checkout_timeout_secs: u64,
    /// Public URL of this service, used for payment return redirects
    pub site_url: String,
    /// Fee a professional pays per claimed lead, in minor units (cents)
    pub lead_fee_minor_units: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/home_connect".to_string(),
            log_level: "info".to_string(),
            checkout_base_url: "https://pay.example.com/api".to_string(),
            checkout_api_key: "sk_test_placeholder".to_string(),
            checkout_timeout_secs: 30,
            site_url: "http://localhost:8080".to_string(),
            lead_fee_minor_units: domain_leads::coordinator::LEAD_FEE_MINOR_UNITS,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checkout gateway configuration derived from this config
    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            base_url: self.checkout_base_url.clone(),
            api_key: self.checkout_api_key.clone(),
            site_url: self.site_url.clone(),
            timeout_secs: self.checkout_timeout_secs,
        }
    }

    /// The configured lead fee
    pub fn lead_fee(&self) -> Money {
        Money::from_minor(self.lead_fee_minor_units, Currency::USD)
    }
}
