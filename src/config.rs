// src/config.rs
use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use log::{info, warn};
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_NEWS_BASE_URL: &str = "https://finviz.com/quote.ashx?t=";
pub const DEFAULT_NEWS_USER_AGENT: &str = "my-app";
pub const DEFAULT_QUOTES_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart/";
pub const DEFAULT_QUOTES_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_MARKET_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub news_base_url: String,
    pub news_user_agent: String,
    pub quotes_base_url: String,
    pub quotes_user_agent: String,
    pub market_tz: Tz,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to the
    /// defaults, malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                warn!("${} not set, defaulting to {}", key, default);
                default.to_string()
            })
        };

        let port = var("PORT", &DEFAULT_PORT.to_string())
            .parse::<u16>()
            .context("PORT must be a number")?;

        let tz_name = var("MARKET_TIMEZONE", DEFAULT_MARKET_TIMEZONE);
        let market_tz = tz_name
            .parse::<Tz>()
            .map_err(|e| anyhow!("MARKET_TIMEZONE {:?} is not a valid timezone: {}", tz_name, e))?;

        let timeout_secs = var("HTTP_TIMEOUT_SECS", &DEFAULT_HTTP_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        let config = AppConfig {
            port,
            news_base_url: var("NEWS_BASE_URL", DEFAULT_NEWS_BASE_URL),
            news_user_agent: var("NEWS_USER_AGENT", DEFAULT_NEWS_USER_AGENT),
            quotes_base_url: var("QUOTES_BASE_URL", DEFAULT_QUOTES_BASE_URL),
            quotes_user_agent: var("QUOTES_USER_AGENT", DEFAULT_QUOTES_USER_AGENT),
            market_tz,
            http_timeout: Duration::from_secs(timeout_secs),
        };
        info!("Configuration loaded: port {}, market timezone {}", config.port, config.market_tz);
        Ok(config)
    }
}
