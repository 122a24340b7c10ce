use serde::Deserialize;

/// Where the watchlist is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistBackend {
    /// Redis list, newest entry first
    #[default]
    Redis,
    /// Process memory, same semantics as `redis`
    Memory,
    /// JSON slot files on local disk, oldest entry first
    Local,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Watchlist persistence backend
    #[serde(default)]
    pub watchlist_backend: WatchlistBackend,

    /// Storage key of the shared watchlist
    #[serde(default = "default_watchlist_key")]
    pub watchlist_key: String,

    /// Directory holding slot files for the `local` backend
    #[serde(default = "default_local_store_dir")]
    pub local_store_dir: String,

    /// TMDb API key (v3)
    #[serde(default)]
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Gemini API key; recommendations are disabled without it
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Timeout for upstream HTTP calls, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_watchlist_key() -> String {
    crate::store::DEFAULT_WATCHLIST_KEY.to_string()
}

fn default_local_store_dir() -> String {
    ".cineverse".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address to bind, as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gemini key, treating a blank value as unset
    pub fn gemini_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
