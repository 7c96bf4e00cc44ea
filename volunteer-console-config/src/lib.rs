use core::fmt::{Debug, Display};
use core::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "console.toml";
pub const ENV_PREFIX: &str = "CONSOLE_";

#[derive(Deserialize, Serialize, Clone)]
pub struct Config {
    /// Base url of the REST backend, e.g. `https://volontaires.example.org`.
    pub api_url: String,
    /// Bearer token. Without one every request fails before it is sent.
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    /// Days added on both sides of a study's appointment range when looking for overlaps.
    pub overlap_padding_days: u32,
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_owned(),
            token: None,
            request_timeout_secs: 30,
            overlap_padding_days: 7,
            log_filter: None,
        }
    }
}

impl Config {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// the token may be part of the config so don't derive this
impl Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("overlap_padding_days", &self.overlap_padding_days)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Display::fmt(self, f)
    }
}

#[must_use]
pub fn figment() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
