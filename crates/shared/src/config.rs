//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Payment gateway configuration.
    pub gateway: GatewayConfig,
    /// Default fee configuration.
    #[serde(default)]
    pub fees: FeeSettings,
    /// Payout reconciliation configuration.
    #[serde(default)]
    pub reconciliation: ReconciliationSettings,
    /// Notification collaborator configuration.
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Payment gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway API.
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
    /// Secret API key for gateway calls.
    #[serde(default)]
    pub secret_key: String,
    /// Shared secret for webhook signature verification.
    ///
    /// When empty, signature verification is skipped (local development only).
    #[serde(default)]
    pub webhook_secret: String,
    /// Settlement feed page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_gateway_base_url() -> String {
    "https://api.gateway.test".to_string()
}

fn default_page_size() -> u32 {
    100
}

/// Default fee configuration, all in integer cents / basis points.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeSettings {
    /// Flat platform fee per charge, in cents.
    #[serde(default = "default_platform_fee_cents")]
    pub platform_fee_cents: i64,
    /// Percentage platform fee, in basis points (1/100th of a percent).
    #[serde(default)]
    pub platform_fee_bps: i64,
    /// Percentage gateway processing fee, in basis points.
    #[serde(default = "default_gateway_fee_bps")]
    pub gateway_fee_bps: i64,
    /// Flat gateway processing fee per charge, in cents.
    #[serde(default = "default_gateway_fee_cents")]
    pub gateway_fee_cents: i64,
}

fn default_platform_fee_cents() -> i64 {
    200
}

fn default_gateway_fee_bps() -> i64 {
    290
}

fn default_gateway_fee_cents() -> i64 {
    30
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            platform_fee_cents: default_platform_fee_cents(),
            platform_fee_bps: 0,
            gateway_fee_bps: default_gateway_fee_bps(),
            gateway_fee_cents: default_gateway_fee_cents(),
        }
    }
}

/// Payout reconciliation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationSettings {
    /// Absolute drift (in cents) above which a warning alert is raised.
    #[serde(default = "default_drift_threshold_cents")]
    pub drift_threshold_cents: i64,
}

fn default_drift_threshold_cents() -> i64 {
    100
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            drift_threshold_cents: default_drift_threshold_cents(),
        }
    }
}

/// Notification collaborator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    /// Endpoint of the external messaging service.
    ///
    /// When empty, notification requests are logged and dropped.
    #[serde(default)]
    pub endpoint: String,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PINEWOOD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_settings_defaults() {
        let fees = FeeSettings::default();
        assert_eq!(fees.platform_fee_cents, 200);
        assert_eq!(fees.platform_fee_bps, 0);
        assert_eq!(fees.gateway_fee_bps, 290);
        assert_eq!(fees.gateway_fee_cents, 30);
    }

    #[test]
    fn test_reconciliation_defaults() {
        let rec = ReconciliationSettings::default();
        assert_eq!(rec.drift_threshold_cents, 100);
    }

    #[test]
    fn test_notification_defaults() {
        let n = NotificationSettings::default();
        assert!(n.endpoint.is_empty());
    }
}
