//! # Sync Configuration
//!
//! Configuration for the InfoPlus connection, rate limits and the per-kind
//! sync switches.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INFOPLUS_API_KEY=...                                               │
//! │     INFOPLUS_SYNC_ORDERS=false                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/infoplus-sync/infoplus-sync.toml (Linux)                 │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     every kind enabled, 3 retries, 1s × 1.5 backoff, 250 per page      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! api_key = "secret"
//! domain = "acme"
//! lob_id = 17
//! warehouse_id = 3
//! default_carrier_id = 1
//!
//! [rate_limit]
//! identity = "storefront"
//! identity_capacity = 10
//! identity_refill_per_sec = 5.0
//!
//! [sync]
//! orders = true
//! customer_write_pause_ms = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::retry::RetryPolicy;
use infoplus_core::SyncKind;

// =============================================================================
// API Settings
// =============================================================================

/// Connection settings for the InfoPlus REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Static key sent in the `API-Key` header.
    #[serde(default)]
    pub api_key: String,

    /// Tenant subdomain: `https://{domain}.infopluswms.com`.
    #[serde(default)]
    pub domain: String,

    /// Full base URL. Overrides `domain` when set (staging, local mocks).
    #[serde(default)]
    pub base_url: Option<String>,

    /// API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Line of business every record is scoped to.
    #[serde(default)]
    pub lob_id: i64,

    /// Warehouse used for orders and inventory.
    #[serde(default)]
    pub warehouse_id: i64,

    /// Carrier used for orders and as the preferred package carrier.
    #[serde(default)]
    pub default_carrier_id: i64,

    /// Per-call HTTP timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts for write requests, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Records per search page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_api_version() -> String {
    "v3.0".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    1000
}
fn default_backoff_multiplier() -> f64 {
    1.5
}
fn default_page_size() -> u32 {
    infoplus_core::DEFAULT_PAGE_SIZE
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            api_key: String::new(),
            domain: String::new(),
            base_url: None,
            api_version: default_api_version(),
            lob_id: 0,
            warehouse_id: 0,
            default_carrier_id: 0,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            page_size: default_page_size(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for write requests.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            initial_interval: Duration::from_millis(self.initial_backoff_ms),
            multiplier: self.backoff_multiplier,
        }
    }

    /// Base URL every endpoint is joined onto. Always ends with `/`.
    pub fn base_url(&self) -> SyncResult<Url> {
        let raw = match &self.base_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.infopluswms.com/infoplus-wms/api/{}/",
                self.domain, self.api_version
            ),
        };

        let raw = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        Ok(Url::parse(&raw)?)
    }
}

// =============================================================================
// Rate Limit Settings
// =============================================================================

/// Token bucket sizes for the two limiter scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Application-level identity the first bucket is keyed by.
    #[serde(default = "default_identity")]
    pub identity: String,

    #[serde(default = "default_identity_capacity")]
    pub identity_capacity: u32,

    #[serde(default = "default_identity_refill")]
    pub identity_refill_per_sec: f64,

    #[serde(default = "default_domain_capacity")]
    pub domain_capacity: u32,

    #[serde(default = "default_domain_refill")]
    pub domain_refill_per_sec: f64,
}

fn default_identity() -> String {
    "infoplus-sync".to_string()
}
fn default_identity_capacity() -> u32 {
    10
}
fn default_identity_refill() -> f64 {
    5.0
}
fn default_domain_capacity() -> u32 {
    20
}
fn default_domain_refill() -> f64 {
    10.0
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        RateLimitSettings {
            identity: default_identity(),
            identity_capacity: default_identity_capacity(),
            identity_refill_per_sec: default_identity_refill(),
            domain_capacity: default_domain_capacity(),
            domain_refill_per_sec: default_domain_refill(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Per-kind switches and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_true")]
    pub categories: bool,

    #[serde(default = "default_true")]
    pub customers: bool,

    #[serde(default = "default_true")]
    pub products: bool,

    /// Requires categories, customers and products.
    #[serde(default = "default_true")]
    pub orders: bool,

    #[serde(default = "default_true")]
    pub inventory: bool,

    /// Pause after each customer write (milliseconds).
    #[serde(default = "default_customer_pause")]
    pub customer_write_pause_ms: u64,

    /// Interval between order status reconciliations (seconds).
    #[serde(default = "default_status_poll")]
    pub status_poll_interval_secs: u64,

    /// Age after which an open run record is considered abandoned (seconds).
    #[serde(default = "default_stale_run")]
    pub stale_run_secs: u64,

    /// Capacity of the background job queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_true() -> bool {
    true
}
fn default_customer_pause() -> u64 {
    500
}
fn default_status_poll() -> u64 {
    900
}
fn default_stale_run() -> u64 {
    3600
}
fn default_queue_capacity() -> usize {
    256
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            categories: true,
            customers: true,
            products: true,
            orders: true,
            inventory: true,
            customer_write_pause_ms: default_customer_pause(),
            status_poll_interval_secs: default_status_poll(),
            stale_run_secs: default_stale_run(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl SyncSettings {
    /// Whether a sync kind is switched on.
    ///
    /// Status reconciliation follows the orders switch.
    pub fn is_enabled(&self, kind: SyncKind) -> bool {
        match kind {
            SyncKind::Categories => self.categories,
            SyncKind::Customers => self.customers,
            SyncKind::Products => self.products,
            SyncKind::Orders | SyncKind::OrderStatus => self.orders,
            SyncKind::Inventory => self.inventory,
        }
    }

    fn set_enabled(&mut self, kind: SyncKind, enabled: bool) {
        match kind {
            SyncKind::Categories => self.categories = enabled,
            SyncKind::Customers => self.customers = enabled,
            SyncKind::Products => self.products = enabled,
            SyncKind::Orders | SyncKind::OrderStatus => self.orders = enabled,
            SyncKind::Inventory => self.inventory = enabled,
        }
    }

    pub fn customer_write_pause(&self) -> Duration {
        Duration::from_millis(self.customer_write_pause_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs)
    }

    pub fn stale_run_after(&self) -> Duration {
        Duration::from_secs(self.stale_run_secs)
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Local database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (infoplus-sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(SyncError::InvalidConfig("api_key must be set".into()));
        }

        if self.api.base_url.is_none() && self.api.domain.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "domain must be set when base_url is not".into(),
            ));
        }
        self.api.base_url()?;

        if self.api.lob_id <= 0 {
            return Err(SyncError::InvalidConfig(
                "lob_id must be greater than 0".into(),
            ));
        }

        if self.api.page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        if self.api.max_retries == 0 {
            return Err(SyncError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }

        if self.sync.orders {
            let missing: Vec<&str> = [
                ("products", self.sync.products),
                ("categories", self.sync.categories),
                ("customers", self.sync.customers),
            ]
            .into_iter()
            .filter(|(_, enabled)| !enabled)
            .map(|(name, _)| name)
            .collect();

            if !missing.is_empty() {
                return Err(SyncError::InvalidConfig(format!(
                    "order sync requires {} sync to be enabled",
                    missing.join(", ")
                )));
            }
        }

        if self.sync.status_poll_interval_secs == 0 || self.sync.queue_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "status_poll_interval_secs and queue_capacity must be greater than 0".into(),
            ));
        }

        if self.rate_limit.identity_capacity == 0 || self.rate_limit.domain_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "rate limit capacities must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("INFOPLUS_API_KEY") {
            debug!("Overriding API key from environment");
            self.api.api_key = key;
        }

        if let Ok(domain) = std::env::var("INFOPLUS_DOMAIN") {
            debug!(domain = %domain, "Overriding domain from environment");
            self.api.domain = domain;
        }

        if let Ok(url) = std::env::var("INFOPLUS_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.api.base_url = Some(url);
        }

        override_parsed("INFOPLUS_LOB_ID", &mut self.api.lob_id);
        override_parsed("INFOPLUS_WAREHOUSE_ID", &mut self.api.warehouse_id);
        override_parsed("INFOPLUS_DEFAULT_CARRIER_ID", &mut self.api.default_carrier_id);
        override_parsed("INFOPLUS_MAX_RETRIES", &mut self.api.max_retries);

        for kind in [
            SyncKind::Categories,
            SyncKind::Customers,
            SyncKind::Products,
            SyncKind::Orders,
            SyncKind::Inventory,
        ] {
            let var = format!("INFOPLUS_SYNC_{}", kind.as_str().to_uppercase());
            if let Ok(value) = std::env::var(&var) {
                match parse_flag(&value) {
                    Some(enabled) => self.sync.set_enabled(kind, enabled),
                    None => warn!(var = %var, value = %value, "Ignoring non-boolean sync flag"),
                }
            }
        }

        if let Ok(path) = std::env::var("INFOPLUS_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("infoplus-sync.toml"))
    }

    /// Returns the configured database path or the platform default.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("infoplus-sync.db")))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn is_enabled(&self, kind: SyncKind) -> bool {
        self.sync.is_enabled(kind)
    }

    pub fn lob_id(&self) -> i64 {
        self.api.lob_id
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "infoplus", "infoplus-sync")
}

fn override_parsed<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(value) = std::env::var(var) {
        match value.parse::<T>() {
            Ok(parsed) => {
                debug!(var = %var, "Overriding from environment");
                *target = parsed;
            }
            Err(_) => warn!(var = %var, value = %value, "Ignoring unparseable override"),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
