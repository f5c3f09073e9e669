use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Where the resource API lives and how hard to try reaching it.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the REST API. Default: "http://127.0.0.1:3000/api/v1".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Default: 10.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for idempotent reads on transient failures. Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    /// Base delay for exponential backoff. Default: 200.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    /// Backoff ceiling. Default: 5000.
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000/api/v1".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u8 {
    3
}
fn default_retry_base_ms() -> u64 {
    200
}
fn default_retry_max_ms() -> u64 {
    5000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
        }
    }
}

/// Credentials for the auth provider's tokens.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token of the current session. Absent means anonymous.
    #[serde(default)]
    pub token: Option<String>,
    /// Shared secret used to verify the token's signature.
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

/// Client application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClientAppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ClientAppConfig {
    /// Load from `config/config.toml` (or `$RESHARE_CONFIG`), then
    /// `RESHARE__SECTION__KEY` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("RESHARE_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("backend.base_url", default_base_url())?
            .set_default("backend.timeout_secs", 10_i64)?
            .set_default("backend.max_retries", 3_i64)?
            .set_default("backend.retry_base_ms", 200_i64)?
            .set_default("backend.retry_max_ms", 5000_i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("RESHARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
