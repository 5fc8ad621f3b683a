//! Runtime configuration loaded from environment variables.
//!
//! Supported env vars:
//! - `CF_API_TOKEN`: comma separated API tokens
//! - `TG_BOT_TOKEN` / `TG_CHAT_ID`: Telegram destination (both required to notify)
//! - `BATCH_SIZE` (10), `PER_PAGE` (50)
//! - `CRON_SCHEDULE` (`0 0 * * * *`), `CRON_TIMEZONE` (`Asia/Shanghai`)
//! - `API_BIND_ADDRESS` (`0.0.0.0`), `API_PORT` (8787), `API_ENABLE_CORS` (true)
//! - `DATABASE_URL` (`sqlite:snippet-monitor.db?mode=rwc`)
//! - `LOG_DIR` (unset: console only)
//! - `CF_API_BASE_URL` (production API)
//! - `RETRY_MAX_ATTEMPTS` (0), `RETRY_BASE_DELAY_MS` (500)

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::warn;

use crate::monitor::{DEFAULT_BATCH_SIZE, DEFAULT_PER_PAGE, RetryPolicy};
use crate::notification::TelegramConfig;
use crate::{Error, Result};

pub const DEFAULT_CRON_SCHEDULE: &str = "0 0 * * * *";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Shanghai;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:snippet-monitor.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Raw token string, parsed on every run.
    pub api_tokens: Option<String>,
    pub telegram: Option<TelegramConfig>,
    pub batch_size: usize,
    pub per_page: u32,
    pub cron_schedule: String,
    pub timezone: Tz,
    pub bind_address: String,
    pub port: u16,
    pub enable_cors: bool,
    pub database_url: String,
    pub log_dir: Option<String>,
    pub api_base_url: String,
    pub retry: RetryPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_tokens: None,
            telegram: None,
            batch_size: DEFAULT_BATCH_SIZE,
            per_page: DEFAULT_PER_PAGE,
            cron_schedule: DEFAULT_CRON_SCHEDULE.to_string(),
            timezone: DEFAULT_TIMEZONE,
            bind_address: "0.0.0.0".to_string(),
            port: 8787,
            enable_cors: true,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_dir: None,
            api_base_url: cloudflare_client::DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::none(),
        }
    }
}

impl MonitorConfig {
    /// Load from the process environment, falling back to defaults.
    pub fn from_env_or_default() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults with a warning. An
    /// invalid timezone or cron expression is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.api_tokens = lookup("CF_API_TOKEN");
        config.telegram = TelegramConfig::from_parts(
            lookup("TG_BOT_TOKEN").as_deref(),
            lookup("TG_CHAT_ID").as_deref(),
        );

        config.batch_size = parse_or("BATCH_SIZE", get("BATCH_SIZE"), config.batch_size).max(1);
        config.per_page = parse_or("PER_PAGE", get("PER_PAGE"), config.per_page).max(1);
        config.port = parse_or("API_PORT", get("API_PORT"), config.port);
        config.enable_cors = parse_or("API_ENABLE_CORS", get("API_ENABLE_CORS"), config.enable_cors);

        if let Some(schedule) = get("CRON_SCHEDULE") {
            cron::Schedule::from_str(&schedule)
                .map_err(|e| Error::config(format!("Invalid CRON_SCHEDULE '{schedule}': {e}")))?;
            config.cron_schedule = schedule;
        }

        if let Some(tz) = get("CRON_TIMEZONE") {
            config.timezone = tz
                .parse()
                .map_err(|_| Error::config(format!("'{tz}' is not a valid IANA timezone")))?;
        }

        if let Some(bind) = get("API_BIND_ADDRESS") {
            config.bind_address = bind;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        config.log_dir = log_dir_from_lookup(&lookup);
        if let Some(base) = get("CF_API_BASE_URL") {
            config.api_base_url = base;
        }

        let max_retries = parse_or("RETRY_MAX_ATTEMPTS", get("RETRY_MAX_ATTEMPTS"), 0u32);
        let base_delay_ms = parse_or("RETRY_BASE_DELAY_MS", get("RETRY_BASE_DELAY_MS"), 500u64);
        config.retry = RetryPolicy::none()
            .with_max_retries(max_retries)
            .with_base_delay(Duration::from_millis(base_delay_ms));

        Ok(config)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.telegram.is_some()
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// `LOG_DIR` alone, so logging can start before the rest of the config is
/// loaded and its warnings are recorded.
pub fn log_dir_from_lookup<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LOG_DIR").map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, default = %default, "Invalid value, using default");
                default
            }
        },
        None => default,
    }
}
