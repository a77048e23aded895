use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Organization assigned to field reports submitted without one.
pub const FALLBACK_ORGANIZATION_ID: Uuid = Uuid::from_u128(0x11111111_1111_1111_1111_111111111111);

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "FIELDCHECK_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,

    /// Base URL of the hosted data service; `/rest/v1` and `/auth/v1` hang off it.
    pub data_url: Url,
    /// Public key, sent on every call and used as the bearer for anonymous access.
    pub anon_key: String,
    /// Bypasses row-level security. Admin routes are disabled when unset.
    pub service_role_key: Option<String>,

    pub insecure_cookie: bool,
    pub metrics_ttl_secs: u64,
    pub default_organization_id: Uuid,

    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            data_url: Url::parse("http://127.0.0.1:54321").expect("static url is valid"),
            anon_key: String::new(),
            service_role_key: None,
            insecure_cookie: false,
            metrics_ttl_secs: 15,
            default_organization_id: FALLBACK_ORGANIZATION_ID,
            connect_timeout_secs: 5,
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `FIELDCHECK_*` environment variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, figment::Error> {
        let cfg: Self = Self::figment().extract()?;
        if cfg.anon_key.trim().is_empty() {
            return Err(figment::Error::from(format!(
                "missing `anon_key` (set {ENV_PREFIX}ANON_KEY)"
            )));
        }
        Ok(cfg)
    }

    pub fn metrics_ttl(&self) -> Duration {
        Duration::from_secs(self.metrics_ttl_secs.max(1))
    }

    pub fn build_http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("fieldcheck/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}
