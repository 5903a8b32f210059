use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::{BrowserProfile, RetryPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Web front-end origin, also used to build the referer
    pub origin: String,
    pub invite_code: String,
    pub user_agent: String,
    /// Forward proxy for every request; empty means direct
    #[serde(default)]
    pub proxy: String,
    /// 0 disables the per-request timeout
    #[serde(default)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub delay_secs: u64,
    /// 0 retries forever
    pub max_attempts: u32,
    /// Statuses the profile fetch retries on
    pub retry_statuses: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub wallet_path: PathBuf,
    pub output_path: PathBuf,
    /// Log and skip a failing wallet instead of aborting the run
    #[serde(default)]
    pub continue_on_error: bool,
    /// Drop the session cookie before each wallet's login
    #[serde(default)]
    pub fresh_session_per_wallet: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_secs: 5,
            max_attempts: 0,
            retry_statuses: vec![crate::http::BAD_GATEWAY],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://points-api.lavanet.xyz".to_string(),
                origin: "https://points.lavanet.xyz".to_string(),
                invite_code: "WQ4MC".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                    .to_string(),
                proxy: String::new(),
                request_timeout_secs: 0,
            },
            retry: RetryConfig::default(),
            run: RunConfig {
                wallet_path: PathBuf::from("wallets.csv"),
                output_path: PathBuf::from("rpcData.csv"),
                continue_on_error: false,
                fresh_session_per_wallet: false,
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ApiConfig {
    pub fn proxy(&self) -> Option<&str> {
        let proxy = self.proxy.trim();
        (!proxy.is_empty()).then_some(proxy)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn browser_profile(&self) -> BrowserProfile {
        let authority = self
            .base_url
            .split("://")
            .nth(1)
            .unwrap_or(&self.base_url)
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();

        BrowserProfile {
            authority,
            origin: self.origin.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl RetryConfig {
    fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    fn max_attempts(&self) -> Option<u32> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }

    /// Policy for the signed login submission: retry everything.
    pub fn verify_policy(&self) -> RetryPolicy {
        RetryPolicy::unconditional(self.delay()).with_max_attempts(self.max_attempts())
    }

    /// Policy for the profile fetch: retry only the listed statuses.
    pub fn profile_policy(&self) -> RetryPolicy {
        RetryPolicy::on_statuses(self.retry_statuses.iter().copied(), self.delay())
            .with_max_attempts(self.max_attempts())
    }
}
