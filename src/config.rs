use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use twelf::{Layer, config};

const DEFAULT_BASE_URL: &str = "https://primabi.co";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const CONFIG_FILE: &str = "bookrent.yaml";
pub const ENV_PREFIX: &str = "BOOKRENT_";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

#[config]
#[derive(Debug, Clone)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; when absent the binary logs in with email/password.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub local_ranking: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            token: None,
            email: None,
            password: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            local_ranking: true,
        }
    }
}

impl Config {
    /// `bookrent.yaml` (if present) overridden by `BOOKRENT_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let mut layers = Vec::new();
        if Path::new(CONFIG_FILE).exists() {
            layers.push(Layer::Yaml(CONFIG_FILE.into()));
        }
        layers.push(Layer::Env(Some(ENV_PREFIX.to_string())));
        Config::with_layers(&layers).with_context(|| "Failed to load configuration")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("BOOKRENT_BASE_URL is missing".into());
        }
        if !(1..=60).contains(&self.page_size) {
            return Err(format!(
                "BOOKRENT_PAGE_SIZE must be between 1 and 60, got {}",
                self.page_size
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("BOOKRENT_REQUEST_TIMEOUT_SECS must be positive".into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn login_credentials(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => Some((e, p)),
            _ => None,
        }
    }
}
