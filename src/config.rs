use anyhow::{Context, Result};
use serde::Deserialize;

use crate::gate::MAX_SESSIONS;
use crate::vendor::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    /// Vendor boundary settings. The api_key has no default: startup fails
    /// when the credential is absent from file and environment.
    pub vendor: VendorConfig,

    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorConfig {
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_service_name() -> String {
    "parley".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_sessions() -> usize {
    MAX_SESSIONS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Layer an optional config file under environment overrides.
    ///
    /// `PARLEY__`-prefixed variables override file values; the vendor
    /// credential may also come from `OPENAI_API_KEY` directly.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
            .set_override_option("vendor.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .build()?;

        settings
            .try_deserialize()
            .context("Invalid configuration (is the vendor API key set?)")
    }
}
