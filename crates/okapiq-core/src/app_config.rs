use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Provider API keys. All optional: an adapter without a key is simply not
/// configured for the scan, and the orchestrator runs with whatever remains.
#[derive(Clone, Default)]
pub struct ProviderKeys {
    pub google_maps: Option<String>,
    pub yelp: Option<String>,
    pub serp: Option<String>,
    pub apollo: Option<String>,
    pub census: Option<String>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Optional SQLite scan-history store; `None` disables persistence.
    pub database_url: Option<String>,
    pub provider_keys: ProviderKeys,
    pub adapter_timeout_secs: u64,
    pub scan_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &redact(&self.database_url))
            .field("google_maps_key", &redact(&self.provider_keys.google_maps))
            .field("yelp_key", &redact(&self.provider_keys.yelp))
            .field("serp_key", &redact(&self.provider_keys.serp))
            .field("apollo_key", &redact(&self.provider_keys.apollo))
            .field("census_key", &redact(&self.provider_keys.census))
            .field("adapter_timeout_secs", &self.adapter_timeout_secs)
            .field("scan_timeout_secs", &self.scan_timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
