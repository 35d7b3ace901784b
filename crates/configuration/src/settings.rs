use chrono_tz::Tz;
use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Loaded once at startup and never mutated at runtime. Every tunable the
/// core needs (reporting time zone, cache windows, retry policy, ranking
/// size) lives here so the crates below stay free of hard-coded policy.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Calendar-day bucketing for PNL curves happens in this time zone.
    #[serde(default = "default_reporting_timezone")]
    pub reporting_timezone: Tz,

    /// How many winners/losers the ranked views return.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub api: ApiConfig,
}

/// Parameters for the upstream HTTP client.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout. Expiry surfaces as a transient error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Retry policy for transient fetch failures. Auth and venue errors are
/// never retried regardless of these values.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay; doubles on each subsequent attempt.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

/// Cache time-to-live per endpoint class, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub account_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub positions_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub orders_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub trades_ttl_secs: u64,
}

/// API credentials for the live and testnet environments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub production: ApiKeys,
    #[serde(default)]
    pub testnet: ApiKeys,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
}

fn default_reporting_timezone() -> Tz {
    chrono_tz::UTC
}

fn default_top_n() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    250
}

fn default_ttl_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reporting_timezone: default_reporting_timezone(),
            top_n: default_top_n(),
            http: HttpSettings::default(),
            retry: RetrySettings::default(),
            cache: CacheSettings::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            account_ttl_secs: default_ttl_secs(),
            positions_ttl_secs: default_ttl_secs(),
            orders_ttl_secs: default_ttl_secs(),
            trades_ttl_secs: default_ttl_secs(),
        }
    }
}
