//! Client configuration from environment variables.
//!
//! `.env` is loaded first via dotenvy; real environment variables win.

use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use std::time::Duration;

const BASE_URL: &str = "RENTAL_API_BASE_URL";
const TIMEOUT_SECS: &str = "RENTAL_API_TIMEOUT_SECS";
const CACHE_TTL_SECS: &str = "RENTAL_VEHICLE_CACHE_TTL_SECS";
const RELEASE_ON_CANCEL: &str = "RENTAL_RELEASE_ON_CANCEL";
const UTC_OFFSET_HOURS: &str = "RENTAL_BACKEND_UTC_OFFSET_HOURS";
const LOG_FILTER: &str = "RENTAL_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub vehicle_cache_ttl: Duration,
    pub release_on_cancel: bool,
    pub backend_utc_offset: FixedOffset,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup(BASE_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .with_context(|| format!("{} must be set", BASE_URL))?;

        let timeout_secs: u64 = parse_or(&lookup, TIMEOUT_SECS, 30)?;
        let ttl_secs: u64 = parse_or(&lookup, CACHE_TTL_SECS, 300)?;
        let offset_hours: i32 = parse_or(&lookup, UTC_OFFSET_HOURS, 8)?;

        let release_on_cancel = match lookup(RELEASE_ON_CANCEL) {
            None => true,
            Some(raw) => parse_bool(&raw).with_context(|| {
                format!("{} must be true or false, got {:?}", RELEASE_ON_CANCEL, raw)
            })?,
        };

        let backend_utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .with_context(|| format!("{} out of range: {}", UTC_OFFSET_HOURS, offset_hours))?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            vehicle_cache_ttl: Duration::from_secs(ttl_secs),
            release_on_cancel,
            backend_utc_offset,
            log_filter: lookup(LOG_FILTER).unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got {:?}", key, raw)),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: {}", other),
    }
}
