use crate::app_config::{AppConfig, Environment, ProviderKeys};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let env = parse_environment(&or_default("OKAPIQ_ENV", "development"));
    let bind_addr = parse_addr("OKAPIQ_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("OKAPIQ_LOG_LEVEL", "info");
    let database_url = optional("OKAPIQ_DATABASE_URL");

    // Provider key names kept compatible with the existing deployments.
    let provider_keys = ProviderKeys {
        google_maps: optional("GOOGLE_MAPS_API_KEY"),
        yelp: optional("YELP_API_KEY"),
        serp: optional("SERP_API_KEY"),
        apollo: optional("APOLLO_API_KEY"),
        census: optional("US_CENSUS_API_KEY"),
    };

    let adapter_timeout_secs = parse_u64("OKAPIQ_ADAPTER_TIMEOUT_SECS", "12")?;
    let scan_timeout_secs = parse_u64("OKAPIQ_SCAN_TIMEOUT_SECS", "90")?;
    let cache_ttl_secs = parse_u64("OKAPIQ_CACHE_TTL_SECS", "300")?;
    let user_agent = or_default("OKAPIQ_USER_AGENT", "okapiq/0.1 (market-intelligence)");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        database_url,
        provider_keys,
        adapter_timeout_secs,
        scan_timeout_secs,
        cache_ttl_secs,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn empty_env_produces_development_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should parse");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.database_url.is_none());
        assert!(cfg.provider_keys.google_maps.is_none());
        assert_eq!(cfg.adapter_timeout_secs, 12);
        assert_eq!(cfg.scan_timeout_secs, 90);
        assert_eq!(cfg.cache_ttl_secs, 300);
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let mut map = HashMap::new();
        map.insert("OKAPIQ_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OKAPIQ_BIND_ADDR"),
            "expected InvalidEnvVar(OKAPIQ_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn invalid_scan_timeout_is_rejected() {
        let mut map = HashMap::new();
        map.insert("OKAPIQ_SCAN_TIMEOUT_SECS", "ninety");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OKAPIQ_SCAN_TIMEOUT_SECS")
        );
    }

    #[test]
    fn empty_api_key_treated_as_unset() {
        let mut map = HashMap::new();
        map.insert("YELP_API_KEY", "");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert!(cfg.provider_keys.yelp.is_none());
    }

    #[test]
    fn provider_keys_are_picked_up() {
        let mut map = HashMap::new();
        map.insert("GOOGLE_MAPS_API_KEY", "gk");
        map.insert("YELP_API_KEY", "yk");
        map.insert("SERP_API_KEY", "sk");
        map.insert("APOLLO_API_KEY", "ak");
        map.insert("US_CENSUS_API_KEY", "ck");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(cfg.provider_keys.google_maps.as_deref(), Some("gk"));
        assert_eq!(cfg.provider_keys.yelp.as_deref(), Some("yk"));
        assert_eq!(cfg.provider_keys.serp.as_deref(), Some("sk"));
        assert_eq!(cfg.provider_keys.apollo.as_deref(), Some("ak"));
        assert_eq!(cfg.provider_keys.census.as_deref(), Some("ck"));
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn timeout_overrides_apply() {
        let mut map = HashMap::new();
        map.insert("OKAPIQ_ADAPTER_TIMEOUT_SECS", "15");
        map.insert("OKAPIQ_SCAN_TIMEOUT_SECS", "180");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(cfg.adapter_timeout_secs, 15);
        assert_eq!(cfg.scan_timeout_secs, 180);
    }
}
