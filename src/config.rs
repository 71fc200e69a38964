use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const DEFAULT_LOGIN_URL: &str = "https://live-backstage.tiktok.com/login/";
const DEFAULT_LISTING_URL: &str = "https://live-backstage.tiktok.com/portal/anchor/relation";
const DEFAULT_SHEET_RANGE: &str = "Sheet1!A2:D2";

/// How the core waits for the page to re-render after a UI-mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SettleMode {
    /// Poll a readiness condition, giving up after the settle budget.
    Poll,
    /// Sleep for the whole settle budget.
    Fixed,
}

/// Which pager capability drives the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PagerMode {
    /// Jump to each page through its "Page N" control.
    Index,
    /// Click the next-page button until it disappears.
    Next,
}

/// Wait budgets used by the extractor, navigator and controller.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub table_timeout: Duration,
    pub settle: Duration,
    pub poll_interval: Duration,
    pub settle_mode: SettleMode,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            table_timeout: Duration::from_secs(10),
            settle: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
            settle_mode: SettleMode::Poll,
        }
    }
}

/// Process settings, read from the environment (and `.env`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tiktok_email: Option<String>,
    #[serde(default)]
    pub tiktok_password: Option<String>,
    pub login_url: String,
    pub listing_url: String,
    pub output_dir: PathBuf,
    pub headless: bool,

    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    pub sheet_range: String,
    #[serde(default)]
    pub google_credentials: Option<String>,
    pub google_credentials_path: PathBuf,
    pub disable_google_sheets: bool,

    pub table_timeout_ms: u64,
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
    pub settle_mode: SettleMode,
    pub pager_mode: PagerMode,
    pub navigation_retries: u32,
    pub max_pages: u32,
}

impl Settings {
    /// Load `.env` if present, then build settings from the environment.
    /// Values stay strings until serde converts the numeric and bool fields,
    /// so credentials such as `00123456` are kept verbatim.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_source(Environment::default())
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Timings::default();
        Config::builder()
            .set_default("login_url", DEFAULT_LOGIN_URL)?
            .set_default("listing_url", DEFAULT_LISTING_URL)?
            .set_default("output_dir", "./output")?
            .set_default("headless", true)?
            .set_default("sheet_range", DEFAULT_SHEET_RANGE)?
            .set_default("google_credentials_path", "credentials.json")?
            .set_default("disable_google_sheets", false)?
            .set_default("table_timeout_ms", defaults.table_timeout.as_millis() as u64)?
            .set_default("settle_ms", defaults.settle.as_millis() as u64)?
            .set_default("poll_interval_ms", defaults.poll_interval.as_millis() as u64)?
            .set_default("settle_mode", "poll")?
            .set_default("pager_mode", "index")?
            .set_default("navigation_retries", 0)?
            .set_default("max_pages", 500)?
            .add_source(source)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn timings(&self) -> Timings {
        Timings {
            table_timeout: Duration::from_millis(self.table_timeout_ms),
            settle: Duration::from_millis(self.settle_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            settle_mode: self.settle_mode,
        }
    }

    /// Portal credentials, required only by the `run` command.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.tiktok_email.as_deref(), self.tiktok_password.as_deref()) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => Ok((e, p)),
            _ => anyhow::bail!(
                "TIKTOK_EMAIL or TIKTOK_PASSWORD is not set. Check your .env file."
            ),
        }
    }
}

/// Settings built from the given variables instead of the process environment.
#[cfg(test)]
pub fn test_settings(vars: &[(&str, &str)]) -> Settings {
    let map: std::collections::HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let env = Environment::default().source(Some(map));
    Settings::from_source(env).unwrap()
}
