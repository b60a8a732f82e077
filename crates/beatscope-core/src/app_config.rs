use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub youtube_api_key: Option<String>,
    pub youtube_base_url: String,
    pub youtube_timeout_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub collect_interval_secs: u64,
    pub collector_autostart: bool,
    pub artist_query_delay_ms: u64,
    pub keyword_query_delay_ms: u64,
    pub refresh_query_delay_ms: u64,
    pub cache_ttl_secs: u64,
    pub momentum_jitter: f64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("youtube_base_url", &self.youtube_base_url)
            .field("youtube_timeout_secs", &self.youtube_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("collect_interval_secs", &self.collect_interval_secs)
            .field("collector_autostart", &self.collector_autostart)
            .field("artist_query_delay_ms", &self.artist_query_delay_ms)
            .field("keyword_query_delay_ms", &self.keyword_query_delay_ms)
            .field("refresh_query_delay_ms", &self.refresh_query_delay_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("momentum_jitter", &self.momentum_jitter)
            .finish()
    }
}
