use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

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

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.is_empty());
    let env = parse_environment(&or_default("BEATSCOPE_ENV", "development"))?;

    let bind_addr = or_default("BEATSCOPE_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("BEATSCOPE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("BEATSCOPE_LOG_LEVEL", "info");

    let youtube_api_key = lookup("YOUTUBE_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let youtube_base_url = or_default("BEATSCOPE_YOUTUBE_BASE_URL", DEFAULT_YOUTUBE_BASE_URL);
    let youtube_timeout_secs = parse_u64("BEATSCOPE_YOUTUBE_TIMEOUT_SECS", "30")?;

    let db_max_connections = parse_u32("BEATSCOPE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("BEATSCOPE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("BEATSCOPE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(invalid(
            "BEATSCOPE_DB_MIN_CONNECTIONS",
            format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        ));
    }

    let collect_interval_secs = parse_u64("BEATSCOPE_COLLECT_INTERVAL_SECS", "7200")?;
    if collect_interval_secs == 0 {
        return Err(invalid(
            "BEATSCOPE_COLLECT_INTERVAL_SECS",
            "interval must be greater than zero".to_string(),
        ));
    }
    let collector_autostart = parse_bool("BEATSCOPE_COLLECTOR_AUTOSTART", "true")?;
    let artist_query_delay_ms = parse_u64("BEATSCOPE_ARTIST_QUERY_DELAY_MS", "1000")?;
    let keyword_query_delay_ms = parse_u64("BEATSCOPE_KEYWORD_QUERY_DELAY_MS", "800")?;
    let refresh_query_delay_ms = parse_u64("BEATSCOPE_REFRESH_QUERY_DELAY_MS", "1200")?;
    let cache_ttl_secs = parse_u64("BEATSCOPE_CACHE_TTL_SECS", "1800")?;

    let momentum_jitter = or_default("BEATSCOPE_MOMENTUM_JITTER", "0")
        .parse::<f64>()
        .map_err(|e| invalid("BEATSCOPE_MOMENTUM_JITTER", e.to_string()))?;
    if !momentum_jitter.is_finite() || momentum_jitter < 0.0 {
        return Err(invalid(
            "BEATSCOPE_MOMENTUM_JITTER",
            "jitter must be a non-negative number".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        youtube_api_key,
        youtube_base_url,
        youtube_timeout_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        collect_interval_secs,
        collector_autostart,
        artist_query_delay_ms,
        keyword_query_delay_ms,
        refresh_query_delay_ms,
        cache_ttl_secs,
        momentum_jitter,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BEATSCOPE_ENV".to_string(),
            reason: format!(
                "unrecognized environment '{other}'; expected development, test, or production"
            ),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
