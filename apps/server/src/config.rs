//! Application configuration.

use pricewatch_core::{MarketCategory, VENUE_CATALOG};
use pricewatch_engine::{ResolverConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Polling scheduler configuration.
    pub scheduler: SchedulerSettings,
    /// Symbol resolution configuration.
    pub resolver: ResolverSettings,
    /// Scanner endpoint configuration.
    pub scanner: ScannerSettings,
    /// Telegram configuration.
    pub telegram: TelegramSettings,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerSettings::default(),
            resolver: ResolverSettings::default(),
            scanner: ScannerSettings::default(),
            telegram: TelegramSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing or unreadable file falls back to
    /// defaults so the bot can boot on a fresh host.
    pub fn load(path: &str) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Config file {path} not readable ({err}), using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!("Config file {path} is invalid ({err}), using defaults");
                Self::default()
            }
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Seconds between evaluation passes.
    pub poll_interval_secs: u64,
    /// Delay before the first pass.
    pub warmup_delay_secs: u64,
    /// Per-fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 29,
            warmup_delay_secs: 10,
            fetch_timeout_secs: 10,
        }
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        SchedulerConfig {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            warmup_delay: Duration::from_secs(settings.warmup_delay_secs),
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
        }
    }
}

/// Symbol resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Venues the fallback search probes, in order.
    pub venues: Vec<String>,
    /// Categories the fallback search walks, in order.
    pub categories: Vec<MarketCategory>,
    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Concurrent probes during the fallback search.
    pub fan_out: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            venues: VENUE_CATALOG.iter().map(|v| v.to_string()).collect(),
            categories: MarketCategory::fallback_order().to_vec(),
            probe_timeout_secs: 8,
            fan_out: 16,
        }
    }
}

impl From<&ResolverSettings> for ResolverConfig {
    fn from(settings: &ResolverSettings) -> Self {
        ResolverConfig {
            venues: settings.venues.clone(),
            categories: settings.categories.clone(),
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
            fan_out: settings.fan_out,
        }
    }
}

/// Scanner endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScannerSettings {
    /// Override for the scanner base URL. `None` uses the public endpoint.
    pub base_url: Option<String>,
}

/// Telegram settings. The bot token itself comes from the
/// `TELEGRAM_BOT_TOKEN` environment variable, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelegramSettings {
    /// Channel users must belong to before they may touch alerts.
    /// `None` disables the check.
    pub required_channel: Option<String>,
}
