use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::utils::CircuitBreakerConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Layers, later ones win:
// 1. compiled-in defaults
// 2. optional YAML file (config/customer.yaml)
// 3. environment, e.g. CUSTOMER_SERVICE__TIMEOUT_SHORT_MS=250
//
// ============================================================================

pub const DEFAULT_CONFIG_FILE: &str = "config/customer.yaml";
pub const ENV_PREFIX: &str = "CUSTOMER_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub mail: MailConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    /// Load the dev seed data at startup
    pub populate: bool,
    /// Tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            mail: MailConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            populate: true,
            log_filter: "info,customer_service=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from defaults, the default YAML file and the environment
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// Bounds around collaborator calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Single-document reads and writes
    pub timeout_short_ms: u64,
    /// Criteria searches and full listings
    pub timeout_long_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_short_ms: 500,
            timeout_long_ms: 2000,
        }
    }
}

impl ServiceConfig {
    pub fn timeout_short(&self) -> Duration {
        Duration::from_millis(self.timeout_short_ms)
    }

    pub fn timeout_long(&self) -> Duration {
        Duration::from_millis(self.timeout_long_ms)
    }
}

/// Addresses for the new-customer notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
    pub sales: String,
    pub timeout_ms: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "theo@test.de".to_string(),
            sales: "max@test.de".to_string(),
            timeout_ms: 500,
        }
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
