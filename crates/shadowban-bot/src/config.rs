use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use page_fetcher::{FetchBackend, FetcherConfig};
use scan_engine::{parse_scan_times, ScheduleConfig, DEFAULT_BASE_URL, FETCH_TIMEOUT};
use std::env;
use std::time::Duration;

/// Runtime configuration, read from the environment (and `.env`).
pub struct BotConfig {
    // Telegram
    pub bot_token: String,

    // Storage
    pub database_url: String,

    // Status site and fetch backend
    pub base_url: String,
    pub fetcher: FetcherConfig,
    pub fetch_timeout: Duration,

    // Scheduled scans
    pub schedule: ScheduleConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .context("TELEGRAM_BOT_TOKEN not set")?;

        let backend: FetchBackend = get("FETCH_BACKEND")
            .unwrap_or_default()
            .parse()
            .map_err(|e: String| anyhow!(e))
            .context("FETCH_BACKEND")?;

        let fetch_timeout_secs: u64 = match get("FETCH_TIMEOUT_SECS") {
            Some(v) => v.parse().context("FETCH_TIMEOUT_SECS must be a number of seconds")?,
            None => FETCH_TIMEOUT.as_secs(),
        };

        let accept_invalid_certs: bool = get("FETCH_ACCEPT_INVALID_CERTS")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .context("FETCH_ACCEPT_INVALID_CERTS must be true or false")?;

        let times = parse_scan_times(
            &get("SCAN_TIMES").unwrap_or_else(|| "09:00,15:00,21:00".to_string()),
        )
        .map_err(|e| anyhow!(e))
        .context("SCAN_TIMES")?;

        let timezone: Tz = get("SCAN_TIMEZONE")
            .unwrap_or_else(|| "UTC".to_string())
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .context("SCAN_TIMEZONE must be an IANA zone name")?;

        let max_concurrent_sweeps: usize = get("MAX_CONCURRENT_SWEEPS")
            .unwrap_or_else(|| "1".to_string())
            .parse()
            .context("MAX_CONCURRENT_SWEEPS must be a positive integer")?;

        Ok(Self {
            bot_token,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite:data.db".to_string()),
            base_url: get("SHADOWBAN_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fetcher: FetcherConfig {
                backend,
                accept_invalid_certs,
                browserless_url: get("BROWSERLESS_URL"),
                browserless_token: get("BROWSERLESS_TOKEN"),
            },
            fetch_timeout: Duration::from_secs(fetch_timeout_secs.max(1)),
            schedule: ScheduleConfig {
                times,
                timezone,
                max_concurrent_sweeps: max_concurrent_sweeps.max(1),
            },
        })
    }

    /// `09:00, 15:00, 21:00 UTC`
    pub fn schedule_label(&self) -> String {
        schedule_label(&self.schedule)
    }
}

pub fn schedule_label(schedule: &ScheduleConfig) -> String {
    let times: Vec<String> = schedule
        .times
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();
    format!("{} {}", times.join(", "), schedule.timezone.name())
}
