//! Runtime configuration read from the environment (and `.env`).

use crate::BoxError;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Pause between Resource Graph pages, in milliseconds.
pub const SLEEP_MSEC: u64 = 200;
pub const HTTP_TIMEOUT_SECS: u64 = 30;
pub const CLI_TIMEOUT_SECS: u64 = 120;
pub const MAX_CONCURRENCY: usize = 8;
/// Resource Graph accepts at most 1000 rows per page.
pub const GRAPH_PAGE_SIZE: u32 = 1000;

/// Everything the sync needs, built once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub subscription_id: String,
    pub api_token: String,
    pub protect_surface_tag: String,
    pub api_url: String,
    pub provider_id: String,
    pub http_timeout: Duration,
    pub cli_timeout: Duration,
    pub max_concurrency: usize,
    pub graph_page_size: u32,
    pub graph_page_pause: Duration,
    pub dry_run: bool,
    pub sync_interval: Option<Duration>,
    pub snapshot_file: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_timezone: Tz,
}

/// Settings used by the reconciliation pipeline itself.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Ownership tag key read from every resource.
    pub protect_surface_tag: String,
    /// Maintainer id written to, and matched on, AUXO states.
    pub provider_id: String,
    pub max_concurrency: usize,
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Config, BoxError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, BoxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| format!("Missing environment variable {key}"));

        let max_concurrency: usize = parse_or(get("MAX_CONCURRENCY"), "MAX_CONCURRENCY", MAX_CONCURRENCY)?;
        let graph_page_size: u32 = parse_or(get("GRAPH_PAGE_SIZE"), "GRAPH_PAGE_SIZE", GRAPH_PAGE_SIZE)?;
        if !(1..=GRAPH_PAGE_SIZE).contains(&graph_page_size) {
            return Err(format!("GRAPH_PAGE_SIZE must be between 1 and {GRAPH_PAGE_SIZE}").into());
        }

        let sync_interval = match get("SYNC_INTERVAL_SECS") {
            Some(v) => {
                let secs: u64 = parse_value(&v, "SYNC_INTERVAL_SECS")?;
                if secs == 0 {
                    return Err("SYNC_INTERVAL_SECS must be greater than 0".into());
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let snapshot_timezone = match get("SNAPSHOT_TIMEZONE") {
            Some(v) => Tz::from_str(&v).map_err(|e| format!("Invalid SNAPSHOT_TIMEZONE {v}: {e}"))?,
            None => Tz::UTC,
        };

        Ok(Config {
            subscription_id: required("SUBSCRIPTION_ID")?,
            api_token: required("API_TOKEN")?,
            protect_surface_tag: required("PROTECT_SURFACE_TAG")?,
            api_url: required("API_URL")?,
            provider_id: required("AUXO_PROVIDER_AZURE_ID")?,
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                HTTP_TIMEOUT_SECS,
            )?),
            cli_timeout: Duration::from_secs(parse_or(
                get("CLI_TIMEOUT_SECS"),
                "CLI_TIMEOUT_SECS",
                CLI_TIMEOUT_SECS,
            )?),
            max_concurrency: max_concurrency.max(1),
            graph_page_size,
            graph_page_pause: Duration::from_millis(parse_or(get("SLEEP_MSEC"), "SLEEP_MSEC", SLEEP_MSEC)?),
            dry_run: parse_bool(get("DRY_RUN"), "DRY_RUN")?,
            sync_interval,
            snapshot_file: get("INVENTORY_SNAPSHOT_FILE").map(PathBuf::from),
            snapshot_dir: get("INVENTORY_SNAPSHOT_DIR").map(PathBuf::from),
            snapshot_timezone,
        })
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            protect_surface_tag: self.protect_surface_tag.clone(),
            provider_id: self.provider_id.clone(),
            max_concurrency: self.max_concurrency,
        }
    }
}

fn parse_value<T: FromStr>(value: &str, key: &str) -> Result<T, BoxError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| format!("Invalid value for {key}: {value:?} ({e})").into())
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, BoxError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => parse_value(&v, key),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &str) -> Result<bool, BoxError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(format!("Invalid value for {key}: {other:?}").into()),
    }
}
